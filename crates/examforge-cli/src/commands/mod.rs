pub mod delete;
pub mod generate_passage;
pub mod generate_questions;
pub mod init;
pub mod knowledge;
pub mod list;
pub mod new;
pub mod render;
pub mod save;
pub mod show;
pub mod shuffle;
pub mod validate;
