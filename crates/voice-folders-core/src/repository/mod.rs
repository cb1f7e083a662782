mod folder_repository;
mod repository_handle;

pub use {folder_repository::FolderRepository, repository_handle::RepositoryHandle};

pub(crate) use repository_handle::RepositoryCommand;
