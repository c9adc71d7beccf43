pub mod session;

pub use session::LiveSessionService;
