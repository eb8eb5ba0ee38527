//! HTTP/1.1 server over the handler seam.
//!
//! Each connection runs on its own task; dropping the task mid-request drops
//! the in-flight store future with it.

use crate::http::{Handler, Request, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Request bodies over this size are rejected before being read.
const MAX_BODY_SIZE: u64 = 1024 * 1024;

pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	pub fn new<H: Handler + 'static>(handler: H) -> Self {
		Self {
			handler: Arc::new(handler),
		}
	}

	/// Bind and accept until the process is stopped.
	pub async fn listen(self, addr: SocketAddr) -> anyhow::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		tracing::info!(%addr, "listening");

		loop {
			let (stream, peer) = listener.accept().await?;
			let handler = self.handler.clone();
			tokio::spawn(async move {
				if let Err(err) = Self::handle_connection(stream, handler).await {
					tracing::warn!(%peer, error = %err, "connection error");
				}
			});
		}
	}

	async fn handle_connection(
		stream: TcpStream,
		handler: Arc<dyn Handler>,
	) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService { handler };
		http1::Builder::new().serve_connection(io, service).await
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();

		Box::pin(async move {
			let (parts, body) = req.into_parts();

			let body_bytes = match http_body_util::Limited::new(body, MAX_BODY_SIZE as usize)
				.collect()
				.await
			{
				Ok(collected) => collected.to_bytes(),
				Err(_) => {
					return Ok(hyper::Response::builder()
						.status(StatusCode::PAYLOAD_TOO_LARGE)
						.body(Full::new(Bytes::from_static(b"Request body too large")))?);
				}
			};

			let request = Request::new(parts.method, parts.uri)
				.with_headers(parts.headers)
				.with_body(body_bytes);

			// The logging middleware renders errors; anything still escaping
			// here gets the same JSON mapping as a backstop.
			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(error) => Response::from(&error),
			};

			into_hyper(response)
		})
	}
}

fn into_hyper(
	response: Response,
) -> Result<hyper::Response<Full<Bytes>>, Box<dyn std::error::Error + Send + Sync>> {
	let mut builder = hyper::Response::builder().status(response.status);
	for (key, value) in response.headers.iter() {
		builder = builder.header(key, value);
	}
	Ok(builder.body(Full::new(response.body))?)
}
