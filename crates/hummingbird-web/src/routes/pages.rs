use axum::response::Response;

use crate::auth::middleware::PageSession;
use crate::static_files;

/// The streaming page. The page's script opens `/websocket` and sends
/// `read_camera`.
pub async fn index(_session: PageSession) -> Response {
    static_files::page("index.html")
}
