mod mime;
mod static_files;

pub use static_files::StaticFiles;

use async_std::net::TcpStream;
use async_trait::async_trait;

use crate::error::ServiceError;
use crate::http::HttpMethod;
use crate::http::request::HttpRequest;

/// The method table a [`Server`](crate::net::server::Server) dispatches to.
///
/// A handler that returns `Ok(())` has written its own response (or has
/// already put bytes on the wire and can only log what went wrong after
/// that). An `Err` means nothing has been sent yet: the pipeline answers
/// with the error's status.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    async fn get(&self, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError>;

    async fn post(&self, req: &HttpRequest, _client: &mut TcpStream) -> Result<(), ServiceError> {
        Err(ServiceError::UnsupportedMethod(req.method.to_string()))
    }
}

/// Routes a parsed request by method. Anything but GET and POST is
/// answered 501 without reaching the service.
pub async fn dispatch<S>(service: &S, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError>
where
    S: Service + ?Sized,
{
    match req.method {
        HttpMethod::Get => service.get(req, client).await,
        HttpMethod::Post => service.post(req, client).await,
        _ => Err(ServiceError::UnsupportedMethod(req.method.to_string())),
    }
}
