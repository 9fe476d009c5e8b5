//! Local HTTP origin for loader and probe tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub struct Origin {
    pub url: String,
    /// Body bytes the origin managed to hand to the socket.
    pub written: Arc<AtomicUsize>,
}

impl Origin {
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }
}

/// Answers every request with `status` and `body`. `declare_length` controls
/// whether a `Content-Length` header is sent; without it the body runs until
/// the connection closes. `padding` extra zero bytes follow the body.
pub async fn serve(
    status: &'static str,
    body: Vec<u8>,
    declare_length: bool,
    padding: usize,
) -> Origin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let written = Arc::new(AtomicUsize::new(0));
    let counter = written.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            let counter = counter.clone();

            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;

                let mut head = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
                if declare_length {
                    head.push_str(&format!("Content-Length: {}\r\n", body.len() + padding));
                }
                head.push_str("\r\n");

                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                if socket.write_all(&body).await.is_err() {
                    return;
                }
                counter.fetch_add(body.len(), Ordering::SeqCst);

                let chunk = vec![0u8; 64 * 1024];
                let mut remaining = padding;
                while remaining > 0 {
                    let n = remaining.min(chunk.len());
                    if socket.write_all(&chunk[..n]).await.is_err() {
                        return;
                    }
                    counter.fetch_add(n, Ordering::SeqCst);
                    remaining -= n;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    Origin {
        url: format!("http://{address}/favicon.ico"),
        written,
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::new(width, height)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
