//! OSM-style network tile source over plain HTTP/1.1.
//!
//! One TCP connection per tile, no TLS, redirects or retries. The request is
//! fixed: `GET {uri} HTTP/1.1\r\nHost: {host}\r\n\r\n`, and only an exact
//! `HTTP/1.1 200 OK` status line is accepted.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;

use tracing::debug;

use crate::error::{ConfigError, TileError};
use crate::grid::TileGrid;
use crate::proj::{Projection, PseudoMercator};
use crate::source::config::HttpSourceConfig;
use crate::source::{Cancellation, TileSource};
use crate::tile::codec::decode_png;
use crate::tile::{Tile, TileCoord, DEFAULT_TILE_SIZE};

const STATUS_OK: &str = "HTTP/1.1 200 OK";
const MAX_HEADER_LINES: usize = 128;

pub struct HttpTileSource {
    config: HttpSourceConfig,
    grid: TileGrid,
    projection: Arc<dyn Projection>,
}

impl HttpTileSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let projection = PseudoMercator::new();
        let limits = projection.limits();
        let grid = TileGrid::power_of_two(limits, 0, config.max_zoom, DEFAULT_TILE_SIZE)?;
        Ok(Self {
            config,
            grid,
            projection: Arc::new(projection),
        })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    fn request(&self, coord: TileCoord) -> String {
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\n\r\n",
            self.config.uri(coord.zoom, coord.x, coord.y),
            self.config.host
        )
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let target = (self.config.host.as_str(), self.config.port);
        let Some(timeout) = self.config.timeout else {
            return TcpStream::connect(target);
        };

        let mut last_err = None;
        for addr in target.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }
}

impl TileSource for HttpTileSource {
    fn grid(&self) -> &TileGrid {
        &self.grid
    }

    fn projection(&self) -> Arc<dyn Projection> {
        Arc::clone(&self.projection)
    }

    fn fill_tile(&self, tile: &mut Tile, cancel: &Cancellation) -> Result<(), TileError> {
        if cancel.is_cancelled() {
            return Err(TileError::Cancelled);
        }
        let coord = tile.coord();
        let io_err = |source: io::Error| TileError::Io { coord, source };

        let mut stream = self.connect().map_err(io_err)?;
        stream.write_all(self.request(coord).as_bytes()).map_err(io_err)?;
        debug!(%coord, host = %self.config.host, "tile requested");

        let mut reader = BufReader::new(stream);
        let content_length = read_head(&mut reader).map_err(|e| match e {
            HeadError::Io(source) => TileError::Io { coord, source },
            HeadError::Protocol(msg) => TileError::Http(msg),
        })?;

        let pixels = match content_length {
            Some(len) => decode_png(reader.take(len))?,
            None => decode_png(reader)?,
        };
        tile.set_pixels(pixels)
    }
}

enum HeadError {
    Io(io::Error),
    Protocol(String),
}

impl From<io::Error> for HeadError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Check the status line and skip headers up to the blank line.
///
/// Returns the `Content-Length`, if the server sent one.
fn read_head<R: BufRead>(reader: &mut R) -> Result<Option<u64>, HeadError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let status = line.trim_end_matches(['\r', '\n']);
    if status != STATUS_OK {
        return Err(HeadError::Protocol(format!("unexpected status line {status:?}")));
    }

    let mut content_length = None;
    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(HeadError::Protocol("connection closed inside headers".into()));
        }
        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            return Ok(content_length);
        }
        let Some((name, value)) = header.split_once(':') else {
            return Err(HeadError::Protocol(format!("malformed header {header:?}")));
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            let len = value
                .parse()
                .map_err(|_| HeadError::Protocol(format!("bad Content-Length {value:?}")))?;
            content_length = Some(len);
        } else if name.eq_ignore_ascii_case("transfer-encoding")
            && !value.eq_ignore_ascii_case("identity")
        {
            return Err(HeadError::Protocol(format!("unsupported Transfer-Encoding {value:?}")));
        }
    }
    Err(HeadError::Protocol("too many header lines".into()))
}
