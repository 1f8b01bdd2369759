//! Executes `PageController` commands on a real terminal session.
//!
//! Requests go out through a blocking ureq agent, timers are honoured by
//! sleeping until their deadline, and downloads are written into the
//! configured directory. A one-shot run exits before a success banner would
//! be dismissed, so dismiss timers are dropped once nothing else is pending.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lookup_core::{
    Command, Download, Exchange, HttpMethod, HttpRequest, HttpResponse, PageController, Timer,
    TransportError,
};
use tracing::{debug, info};

use crate::error::CliError;

pub struct Host {
    pub controller: PageController,
    agent: ureq::Agent,
    download_dir: PathBuf,
    queue: VecDeque<Command>,
    timers: Vec<(Instant, Timer)>,
    saved: Vec<PathBuf>,
}

impl Host {
    pub fn new(controller: PageController, download_dir: PathBuf, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            controller,
            agent,
            download_dir,
            queue: VecDeque::new(),
            timers: Vec::new(),
            saved: Vec::new(),
        }
    }

    /// Files written since the host was created.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    /// Queue commands and run until only dismiss timers are left.
    pub fn run(&mut self, commands: Vec<Command>) -> Result<(), CliError> {
        self.queue.extend(commands);
        loop {
            while let Some(command) = self.queue.pop_front() {
                self.apply(command)?;
            }
            let Some(next) = self.next_timer() else {
                break;
            };
            let (deadline, timer) = self.timers.remove(next);
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            let follow_up = self.controller.on_timer(timer);
            self.queue.extend(follow_up);
        }
        if !self.timers.is_empty() {
            debug!(count = self.timers.len(), "dropping dismiss timers");
            self.timers.clear();
        }
        Ok(())
    }

    /// Earliest timer that still changes what the page does.
    fn next_timer(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, (_, timer))| !matches!(timer, Timer::DismissBanner(_)))
            .min_by_key(|(_, (deadline, _))| *deadline)
            .map(|(i, _)| i)
    }

    fn apply(&mut self, command: Command) -> Result<(), CliError> {
        match command {
            Command::Send { ticket, request } => {
                let exchange = self.execute(request);
                let follow_up = self.controller.on_response(ticket, exchange);
                self.queue.extend(follow_up);
            }
            Command::Schedule { timer, after } => {
                self.timers.push((Instant::now() + after, timer));
            }
            Command::Download(download) => {
                let path = save_download(&self.download_dir, download)?;
                info!(path = %path.display(), "saved download");
                self.saved.push(path);
            }
            Command::ScrollTo { target, align } => {
                debug!(?target, ?align, "scroll");
            }
        }
        Ok(())
    }

    fn execute(&self, request: HttpRequest) -> Exchange {
        debug!(method = request.method.as_str(), path = %request.path, "sending");
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.path);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.path);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Write the download into `dir`, keeping only the final path component of
/// the server-supplied name. The bytes are dropped once written.
pub fn save_download(dir: &Path, download: Download) -> Result<PathBuf, CliError> {
    let name = Path::new(&download.filename)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "descarga".into());
    let path = dir.join(name);
    std::fs::write(&path, &download.bytes).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
