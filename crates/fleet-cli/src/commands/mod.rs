pub mod cleanup;
pub mod cluster;
pub mod nodes;
pub mod scale;
pub mod terminate;
pub mod wait;
