pub mod backend;
pub mod content;
pub mod rules;
pub mod text;
