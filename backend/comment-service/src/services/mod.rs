pub mod threads;

pub use threads::ThreadService;
