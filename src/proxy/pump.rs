//! Connection Pumps
//!
//! Copy bytes in one direction between two halves of a proxied session. The
//! request-side pump consults the cache for every client read; the
//! response-side pump fills the entries the request side registered.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{classify, starts_request, SharedCache};
use crate::error::ProxyError;

/// Default read buffer size per direction, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 6000;

/// Client write half, shared because cache hits are answered by the
/// request-side pump while responses are relayed by the response-side pump.
pub type ClientWriter<W> = Arc<Mutex<W>>;

/// Hand-off from the request side to the response side of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillTag {
    /// The next response belongs to a request that must not be cached
    Skip,
    /// The next response fills the entry with this identifier
    Fill(u64),
}

/// What the request-side pump does with one client read.
#[derive(Debug)]
enum Route {
    /// Answer the client from the cache and drop the chunk
    Cached(Vec<u8>),
    /// Forward the chunk upstream, announcing the tag first if there is one
    Forward(Option<FillTag>),
}

async fn route_request(chunk: &[u8], cache: &SharedCache) -> Route {
    let entry = match classify(chunk) {
        Ok(entry) => entry,
        Err(_) => return Route::Forward(starts_request(chunk).then_some(FillTag::Skip)),
    };

    let mut store = cache.write().await;
    if let Some(index) = store.find_fresh_index(&entry.target) {
        if let Ok(hit) = store.get_by_index(index) {
            info!("Responding to [{}] query from cache", hit.target);
            return Route::Cached(hit.body);
        }
    }

    let id = match store.find_by_target(&entry.target) {
        Ok(pending) => pending.id,
        Err(_) => store.append(entry),
    };
    Route::Forward(Some(FillTag::Fill(id)))
}

// == Request Pump ==
/// Copies client bytes upstream until either side closes or fails.
///
/// Cacheable requests with a fresh entry are answered on `client_tx` and are
/// not forwarded. Every other request line is announced on `tags` before its
/// bytes are written upstream. Returns `Ok(())` on end of stream or when the
/// response side has gone away.
pub async fn pump_requests<R, U, C>(
    mut client_rx: R,
    mut upstream_tx: U,
    client_tx: ClientWriter<C>,
    cache: SharedCache,
    tags: mpsc::Sender<FillTag>,
    buffer_size: usize,
) -> Result<(), ProxyError>
where
    R: AsyncRead + Unpin,
    U: AsyncWrite + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size];

    loop {
        let n = client_rx.read(&mut buf).await?;
        if n == 0 {
            debug!("Client closed its side of the session");
            return Ok(());
        }
        let chunk = &buf[..n];

        match route_request(chunk, &cache).await {
            Route::Cached(body) => {
                let mut writer = client_tx.lock().await;
                writer.write_all(&body).await?;
                writer.flush().await?;
                continue;
            }
            Route::Forward(Some(tag)) => {
                if tags.send(tag).await.is_err() {
                    debug!("Response pump gone, stopping request pump");
                    return Ok(());
                }
            }
            Route::Forward(None) => {}
        }

        upstream_tx.write_all(chunk).await?;
        upstream_tx.flush().await?;
    }
}

// == Response Pump ==
/// Copies upstream bytes to the client until either side closes or fails.
///
/// The first read of each response takes the tag its request left on `tags`
/// and fills the matching entry. Reads that find no pending tag continue the
/// previous response and are appended to the entry that response filled.
pub async fn pump_responses<U, C>(
    mut upstream_rx: U,
    client_tx: ClientWriter<C>,
    cache: SharedCache,
    mut tags: mpsc::Receiver<FillTag>,
    buffer_size: usize,
) -> Result<(), ProxyError>
where
    U: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    // Entry filled by the response currently being relayed, if any.
    let mut filling: Option<u64> = None;

    loop {
        let n = upstream_rx.read(&mut buf).await?;
        if n == 0 {
            debug!("Upstream closed its side of the session");
            return Ok(());
        }
        let chunk = &buf[..n];

        match tags.try_recv() {
            Ok(FillTag::Fill(id)) => {
                filling = None;
                if cache.write().await.fill(id, chunk) {
                    debug!("Cached {} bytes for entry {}", n, id);
                    filling = Some(id);
                }
            }
            Ok(FillTag::Skip) => filling = None,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                if let Some(id) = filling {
                    if !cache.write().await.extend(id, chunk) {
                        filling = None;
                    }
                }
            }
        }

        let mut writer = client_tx.lock().await;
        writer.write_all(chunk).await?;
        writer.flush().await?;
    }
}
