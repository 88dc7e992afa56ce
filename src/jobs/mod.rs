pub mod sweeper;

pub use sweeper::ExpirySweeper;
