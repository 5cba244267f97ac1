// Route exports
pub mod queries;

pub use queries::AppState;

use actix_web::web;
use crate::error::{handle_json_payload_error, handle_query_payload_error};
use crate::services::HistoryStore;

pub fn configure_routes<S: HistoryStore>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .service(
            web::scope("/api/v1")
                .configure(queries::configure::<S>),
        );
}
