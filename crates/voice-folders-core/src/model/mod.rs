mod collection;
mod folder;
pub(crate) mod ids;
mod recording;

pub use {
    collection::Collection,
    folder::Folder,
    ids::{FolderId, RecordingId},
    recording::Recording,
};
