pub mod health;
pub mod helpers;
pub mod redirect;
pub mod shorturls;

pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use shorturls::{ShortUrlService, shorturl_routes};
