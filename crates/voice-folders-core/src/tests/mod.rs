mod audio;
mod model;
mod repository;
