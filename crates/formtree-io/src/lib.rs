//! Non-blocking loading of form documents from HTTP(S) or the filesystem.
//!
//! A [`DocumentLoader`] keeps at most one load in flight. Issuing a new
//! request supersedes the outstanding one, so the result a host observes
//! always belongs to the most recent request.

use std::{
    collections::HashSet,
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

use formtree_config::FetchConfig;
use formtree_ir::FormDocument;

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Http(String),
    File(PathBuf),
}

impl DocumentSource {
    /// `http(s)://` URLs load over the network, `file://` URLs and bare
    /// strings are filesystem paths.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let Some((scheme, rest)) = source.split_once("://") else {
            return Ok(DocumentSource::File(PathBuf::from(source)));
        };
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(DocumentSource::Http(source.to_string())),
            "file" => Ok(DocumentSource::File(PathBuf::from(rest))),
            other => Err(LoadError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("blocked: unsupported scheme {0}")]
    UnsupportedScheme(String),
    #[error("blocked: origin {0} not allowed")]
    OriginNotAllowed(String),
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid form document: {0:#}")]
    Document(anyhow::Error),
    #[error("loader worker disconnected")]
    Disconnected,
}

/// Outcome of one load.
#[derive(Debug)]
pub struct LoadResult {
    pub request_id: u64,
    pub source: String,
    pub outcome: Result<FormDocument, LoadError>,
}

struct PendingLoad {
    request_id: u64,
    source: String,
    receiver: Receiver<Result<FormDocument, LoadError>>,
    join: Option<JoinHandle<()>>,
}

impl PendingLoad {
    fn finish(mut self, outcome: Result<FormDocument, LoadError>) -> LoadResult {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        LoadResult {
            request_id: self.request_id,
            source: self.source,
            outcome,
        }
    }
}

/// Loads form documents on worker threads; the latest request wins.
pub struct DocumentLoader {
    pending: Option<PendingLoad>,
    next_request_id: u64,
    allowed_origins: Option<HashSet<String>>, // e.g., "https://example.com:443"
    timeout: Duration,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            pending: None,
            next_request_id: 1,
            allowed_origins: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        let mut loader = Self::new();
        loader.set_timeout(config.timeout());
        if !config.allowed_origins.is_empty() {
            loader.set_origin_allowlist(config.allowed_origins.iter().cloned());
        }
        loader
    }

    /// Configure an allowlist of origins for HTTP(S) sources. When set, any
    /// request to an origin not listed fails without touching the network.
    pub fn set_origin_allowlist<I: IntoIterator<Item = String>>(&mut self, origins: I) {
        self.allowed_origins = Some(origins.into_iter().collect());
    }

    pub fn clear_origin_allowlist(&mut self) {
        self.allowed_origins = None;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Start loading `source` and return its request id. Any load still in
    /// flight is superseded and its result will never be reported.
    pub fn request(&mut self, source: &str) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        if let Some(previous) = self.pending.take() {
            tracing::info!(
                superseded = previous.request_id,
                request_id,
                "superseding pending document load"
            );
        }

        let (tx, rx) = mpsc::channel();
        let allowlist = self.allowed_origins.clone();
        let timeout = self.timeout;
        let source_owned = source.to_string();
        let join = thread::spawn(move || {
            let outcome = DocumentSource::parse(&source_owned)
                .and_then(|parsed| load(parsed, allowlist.as_ref(), timeout));
            let _ = tx.send(outcome);
        });

        tracing::info!(request_id, source, "loading form document");
        self.pending = Some(PendingLoad {
            request_id,
            source: source.to_string(),
            receiver: rx,
            join: Some(join),
        });
        request_id
    }

    /// Cancel a request by id: any eventual result is ignored.
    pub fn cancel(&mut self, request_id: u64) {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.request_id == request_id)
        {
            self.pending = None;
        }
    }

    /// Return the result of the current request if it has finished.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let pending = self.pending.take()?;
        match pending.receiver.try_recv() {
            Ok(outcome) => Some(pending.finish(outcome)),
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
                None
            }
            Err(TryRecvError::Disconnected) => Some(pending.finish(Err(LoadError::Disconnected))),
        }
    }

    /// Block up to `timeout` for the current request to finish.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadResult> {
        let pending = self.pending.take()?;
        match pending.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(pending.finish(outcome)),
            Err(RecvTimeoutError::Timeout) => {
                self.pending = Some(pending);
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                Some(pending.finish(Err(LoadError::Disconnected)))
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

fn load(
    source: DocumentSource,
    allowlist: Option<&HashSet<String>>,
    timeout: Duration,
) -> Result<FormDocument, LoadError> {
    match source {
        DocumentSource::File(path) => {
            let bytes = std::fs::read(&path).map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?;
            FormDocument::from_slice(&bytes).map_err(LoadError::Document)
        }
        DocumentSource::Http(url) => {
            let bytes = fetch(&url, allowlist, timeout)?;
            FormDocument::from_slice(&bytes).map_err(LoadError::Document)
        }
    }
}

fn fetch(
    url: &str,
    allowlist: Option<&HashSet<String>>,
    timeout: Duration,
) -> Result<Vec<u8>, LoadError> {
    let parsed = reqwest::Url::parse(url).map_err(|err| LoadError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })?;
    if let Some(set) = allowlist {
        let origin = origin_of(&parsed);
        if !set.contains(&origin) {
            return Err(LoadError::OriginNotAllowed(origin));
        }
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent("formtree/0.1")
        .timeout(timeout)
        .build()
        .map_err(|err| LoadError::Transport(err.to_string()))?;
    let response = client
        .get(parsed)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|err| LoadError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response
        .bytes()
        .map(|body| body.to_vec())
        .map_err(|err| LoadError::Transport(err.to_string()))
}

fn origin_of(url: &reqwest::Url) -> String {
    match url.port_or_known_default() {
        Some(port) => format!("{}://{}:{}", url.scheme(), url.host_str().unwrap_or(""), port),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("")),
    }
}
