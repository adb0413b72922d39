//! Registry client (C1): talks to the community registry's RPC endpoint
//! and tarball host over `curl`, driving a plain `Easy` handle directly.
use curl::easy::Easy;
use log::debug;
use url::form_urlencoded;

use crate::json_sink::{JsonScanner, PackageListBuilder};
use crate::package::PackageRecord;
use crate::recipe::parse_recipe;
use crate::util::{human, CorralResult};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueryKind {
    Info,
    Search,
    Msearch,
}

impl QueryKind {
    fn rpc_type(self) -> &'static str {
        match self {
            QueryKind::Info => "info",
            QueryKind::Search => "search",
            QueryKind::Msearch => "msearch",
        }
    }
}

pub struct RegistrySession {
    handle: Easy,
    host: String,
    secure: bool,
    extended_info: bool,
}

impl RegistrySession {
    /// One `Easy` handle per worker, held for the worker's whole lifetime
    /// (§5 "each worker owns its HTTP session"). `curl::easy::Easy` handles
    /// are not `Sync`; the pool gives each worker its own, so no locking is
    /// needed around it.
    pub fn new(host: String, secure: bool, timeout_secs: u64, extended_info: bool) -> CorralResult<Self> {
        let mut handle = Easy::new();
        handle
            .connect_timeout(std::time::Duration::from_secs(timeout_secs))
            .map_err(|e| human(format!("failed to configure HTTP session: {}", e)))?;
        handle
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .map_err(|e| human(format!("failed to configure HTTP session: {}", e)))?;
        Ok(RegistrySession {
            handle,
            host,
            secure,
            extended_info,
        })
    }

    fn base_url(&self) -> String {
        format!("{}://{}", if self.secure { "https" } else { "http" }, self.host)
    }

    fn get(&mut self, url: &str) -> CorralResult<Vec<u8>> {
        debug!("GET {}", url);
        self.handle
            .url(url)
            .map_err(|e| human(format!("invalid URL `{}`: {}", url, e)))?;
        self.handle
            .get(true)
            .map_err(|e| human(format!("failed to configure request: {}", e)))?;

        let mut body = Vec::new();
        {
            let mut transfer = self.handle.transfer();
            transfer
                .write_function(|chunk| {
                    body.extend_from_slice(chunk);
                    Ok(chunk.len())
                })
                .map_err(|e| human(format!("failed to configure transfer: {}", e)))?;
            transfer
                .perform()
                .map_err(|e| human(format!("request to `{}` failed: {}", url, e)))?;
        }

        let status = self
            .handle
            .response_code()
            .map_err(|e| human(format!("failed to read response status: {}", e)))?;
        if status >= 400 {
            return Err(human(format!("registry returned HTTP {} for `{}`", status, url)));
        }
        Ok(body)
    }

    /// `Query(kind, arg) → []PackageRecord` (§4.1). Feeds the response
    /// directly into the streaming JSON sink as it arrives, rather than
    /// buffering the whole document before parsing it.
    pub fn query(&mut self, kind: QueryKind, arg: &str) -> CorralResult<Vec<PackageRecord>> {
        let encoded: String = form_urlencoded::byte_serialize(arg.as_bytes()).collect();
        let url = format!(
            "{}/rpc.php?type={}&arg={}",
            self.base_url(),
            kind.rpc_type(),
            encoded
        );
        let body = self.get(&url)?;

        let mut scanner = JsonScanner::new();
        let mut builder = PackageListBuilder::new(false);
        scanner.feed(&body, &mut builder)?;
        scanner.finish(&mut builder)?;

        if builder.is_error_doc() {
            return Err(human(format!("registry reported an error for `{}`", arg)));
        }
        let mut records = builder.into_packages();

        if self.extended_info && !records.is_empty() {
            for record in &mut records {
                if record.url_path.is_empty() {
                    continue;
                }
                self.populate_recipe(record)?;
            }
        }

        Ok(records)
    }

    fn populate_recipe(&mut self, record: &mut PackageRecord) -> CorralResult<()> {
        let dirname = tarball_dirname(&record.url_path);
        let url = format!("{}/{}/PKGBUILD", self.base_url(), dirname);
        let body = self.get(&url)?;
        let text = String::from_utf8_lossy(&body);
        let fields = parse_recipe(&text);
        record.depends = fields.depends;
        record.makedepends = fields.makedepends;
        record.optdepends = fields.optdepends;
        record.provides = fields.provides;
        record.conflicts = fields.conflicts;
        record.replaces = fields.replaces;
        Ok(())
    }

    /// `Download(tarballPathFragment) → bytes` (§4.1). Compression is left
    /// off: the tarball is already gzip-compressed, so asking curl for
    /// transfer-encoding compression on top would be wasted work.
    pub fn download(&mut self, tarball_path_fragment: &str) -> CorralResult<Vec<u8>> {
        let url = format!("{}/{}", self.base_url(), tarball_path_fragment.trim_start_matches('/'));
        self.get(&url)
    }
}

/// Strip the trailing `/<file>.tar.gz` from a tarball path fragment,
/// leaving the directory the recipe's `PKGBUILD` lives alongside.
fn tarball_dirname(url_path: &str) -> String {
    match url_path.rfind('/') {
        Some(pos) => url_path[..pos].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirname_strips_filename() {
        assert_eq!(
            tarball_dirname("/packages/fo/foo/foo.tar.gz"),
            "/packages/fo/foo"
        );
    }
}
