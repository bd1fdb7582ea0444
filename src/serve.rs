//! Purpose: Serve registered routes over a newline-delimited JSON stdio transport.
//! Exports: `ServeConfig`, `serve`.
//! Role: Demo transport; extracts `(id, method, params)` and hands them to the dispatcher.
//! Invariants: stdout only carries reply objects (one JSON value per line).
//! Invariants: stdin EOF exits cleanly; requests without `id` get no reply line.
//! Invariants: A request line never buffers more than `max_line_bytes + 2` bytes.
//! Invariants: Oversized, non-UTF-8 and malformed lines each get one error reply.
//! Notes: Envelope fields beyond `id`/`method`/`params` are ignored, not validated.

use std::io::{self, BufRead, Read, Write};

use serde::Deserialize;
use serde_json::{Map, Value, json};

use jsonrpc_router::api::{
    Dispatcher, Error, ErrorKind, JsonRpcError, Reply, Router, channel, print_routes,
};

use crate::demo_routes::route_groups;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub list_routes: bool,
    pub max_line_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

pub fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    let groups = route_groups();
    if config.list_routes {
        print_routes(&groups);
    }
    let router = Router::new();
    router.register_groups(groups);
    tracing::info!(methods = router.len(), "serving routes on stdio");

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(&router, &config, stdin.lock(), stdout.lock())
}

pub(crate) fn serve_lines<R: BufRead, W: Write>(
    router: &Router,
    config: &ServeConfig,
    mut reader: R,
    mut writer: W,
) -> Result<(), Error> {
    let dispatcher = Dispatcher::new(router);
    let mut line = Vec::new();

    loop {
        let read = read_bounded_line(&mut reader, &mut line, config.max_line_bytes)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read request")
                    .with_source(err)
            })?;
        match read {
            LineRead::Eof => {
                return writer.flush().map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to flush output")
                        .with_source(err)
                });
            }
            LineRead::TooLong => {
                tracing::warn!(limit = config.max_line_bytes, "request line exceeds limit");
                let error = JsonRpcError::invalid_request(format!(
                    "request exceeds {} bytes",
                    config.max_line_bytes
                ));
                write_reply(&mut writer, Value::Null, Reply::Error(error))?;
                continue;
            }
            LineRead::Line => {}
        }

        let message = trim_line_end(&line);
        if message.is_empty() {
            continue;
        }

        let request = match serde_json::from_slice::<Request>(message) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(error = %err, "unparseable request line");
                let error = JsonRpcError::parse_error("invalid request JSON");
                write_reply(&mut writer, Value::Null, Reply::Error(error))?;
                continue;
            }
        };

        let params = match &request.params {
            Some(params) => serde_json::to_vec(params).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to re-encode params")
                    .with_method(&request.method)
                    .with_source(err)
            })?,
            None => Vec::new(),
        };

        let (transmitter, receiver) = channel();
        dispatcher.dispatch(&request.method, &params, transmitter.boxed());
        let reply = receiver.recv().unwrap_or_else(|_| {
            tracing::warn!(method = %request.method, "handler finished without a reply");
            Reply::Error(JsonRpcError::internal_error("handler sent no reply"))
        });

        if let Some(id) = request.id {
            write_reply(&mut writer, id, reply)?;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    TooLong,
}

/// Read one line into `buf`, buffering at most `limit + 2` bytes (room for `\r\n`).
///
/// An oversized line is drained up to its newline without being stored.
fn read_bounded_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> io::Result<LineRead> {
    buf.clear();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(2);
    let read = reader.by_ref().take(cap).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    let terminated = buf.last() == Some(&b'\n');
    if !terminated && u64::try_from(read).unwrap_or(u64::MAX) >= cap {
        buf.clear();
        skip_to_line_end(reader)?;
        return Ok(LineRead::TooLong);
    }
    if trim_line_end(buf).len() > limit {
        buf.clear();
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line)
}

fn skip_to_line_end<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let (used, done) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|byte| *byte == b'\n') {
                Some(index) => (index + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut line = line;
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if config.max_line_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-line-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }
    Ok(())
}

fn write_reply<W: Write>(writer: &mut W, id: Value, reply: Reply) -> Result<(), Error> {
    let mut object = Map::new();
    object.insert("jsonrpc".to_string(), json!("2.0"));
    object.insert("id".to_string(), id);
    match reply {
        Reply::Result(result) => {
            object.insert("result".to_string(), result);
        }
        Reply::Error(error) => {
            let error = serde_json::to_value(error).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode error reply")
                    .with_source(err)
            })?;
            object.insert("error".to_string(), error);
        }
    }

    serde_json::to_writer(&mut *writer, &Value::Object(object)).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode reply")
            .with_source(err)
    })?;
    writer.write_all(b"\n").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write reply")
            .with_source(err)
    })?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush reply")
            .with_source(err)
    })
}
