pub mod category_handlers;
pub mod document_handlers;
pub mod health_handlers;
pub mod request_handlers;
pub mod upload_handlers;
