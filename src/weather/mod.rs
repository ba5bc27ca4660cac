//! Weather endpoints: current conditions, forecast lookup and forecast
//! override submission.

pub mod handlers;
pub mod validation;

use actix_web::web;

pub use handlers::{current_weather, get_forecast, submit_forecast};
pub use validation::ForecastSubmission;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/weather")
            .route("/current", web::get().to(current_weather))
            .route("/forecast", web::get().to(get_forecast))
            .route("/forecast", web::post().to(submit_forecast)),
    );
}
