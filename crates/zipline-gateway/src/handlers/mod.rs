mod health;
mod url;

pub use health::health_handler;
pub use url::{
    create_url_handler, delete_url_by_code_handler, delete_url_by_id_handler,
    get_url_by_code_handler, get_url_by_id_handler, list_urls_handler, redirect_handler,
    update_url_handler, update_url_status_handler,
};
