//! Datasources for self-rendering
//!
//! The main configuration document may declare named datasources under its
//! `selfRender` key (`gomplate` is accepted too). Each one is fetched once, up front, and exposed to
//! self-render templates as both raw text and a parsed value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use url::Url;

use crate::error::{EngineError, Result};

/// The `selfRender` block of the main configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelfRenderConfig {
    /// `name=url` or a bare `url`, whose name is the file stem of its path
    pub datasources: Vec<String>,

    /// `name=Header: value`
    pub datasource_headers: Vec<String>,
}

impl SelfRenderConfig {
    /// Extract the block from a document, if any
    ///
    /// `selfRender` wins over the older `gomplate` key when both are present.
    pub fn from_document(document: &JsonValue) -> Result<Self> {
        let block = document
            .get("selfRender")
            .filter(|block| !block.is_null())
            .or_else(|| document.get("gomplate"));
        match block {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(block) => Ok(serde_json::from_value(block.clone())?),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.datasources.is_empty()
    }

    /// Parse every declaration, attaching its headers
    ///
    /// Relative file references resolve against `base_dir`.
    pub fn declarations(&self, base_dir: &Path) -> Result<Vec<Datasource>> {
        let mut declared = self
            .datasources
            .iter()
            .map(|entry| Datasource::parse(entry, base_dir))
            .collect::<Result<Vec<_>>>()?;

        for entry in &self.datasource_headers {
            let (name, header) = entry.split_once('=').ok_or_else(|| EngineError::Datasource {
                name: entry.clone(),
                message: "header must be written as name=Header: value".to_string(),
            })?;
            let (key, value) = header.split_once(':').ok_or_else(|| EngineError::Datasource {
                name: name.to_string(),
                message: format!("malformed header '{}'", header),
            })?;

            let source = declared
                .iter_mut()
                .find(|d| d.name == name)
                .ok_or_else(|| EngineError::Datasource {
                    name: name.to_string(),
                    message: "header given for an undeclared datasource".to_string(),
                })?;
            source
                .headers
                .push((key.trim().to_string(), value.trim().to_string()));
        }

        Ok(declared)
    }
}

/// A declared datasource
#[derive(Debug, Clone, PartialEq)]
pub struct Datasource {
    pub name: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Datasource {
    /// Parse `name=url` or a bare `url`
    pub fn parse(entry: &str, base_dir: &Path) -> Result<Self> {
        let (alias, target) = match entry.split_once('=') {
            Some((name, rest)) if is_alias(name) => (Some(name.to_string()), rest),
            _ => (None, entry),
        };

        let url = parse_target(target, base_dir).map_err(|message| EngineError::Datasource {
            name: alias.clone().unwrap_or_else(|| target.to_string()),
            message,
        })?;

        let name = match alias {
            Some(name) => name,
            None => Path::new(url.path())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| EngineError::Datasource {
                    name: target.to_string(),
                    message: "cannot derive a name, use name=url".to_string(),
                })?,
        };

        Ok(Self {
            name,
            url,
            headers: Vec::new(),
        })
    }
}

fn is_alias(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn parse_target(target: &str, base_dir: &Path) -> std::result::Result<Url, String> {
    match Url::parse(target) {
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        _ => {
            let path = base_dir.join(target);
            let path = if path.is_absolute() {
                path
            } else {
                std::env::current_dir()
                    .map_err(|e| e.to_string())?
                    .join(path)
            };
            Url::from_file_path(&path).map_err(|_| format!("invalid path {}", path.display()))
        }
    }
}

/// A fetched datasource
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Body as text, exposed through `include`
    pub raw: String,
    /// Body parsed as YAML or JSON when the source says so, else the raw string
    pub value: JsonValue,
}

impl Fetched {
    /// Parse `raw` according to the source's extension or content type
    pub fn parse(name: &str, raw: String, url: &Url, content_type: Option<&str>) -> Result<Self> {
        let extension = Path::new(url.path())
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let content_type = content_type.unwrap_or("").to_ascii_lowercase();

        let structured = matches!(extension.as_deref(), Some("yaml" | "yml" | "json"))
            || content_type.contains("yaml")
            || content_type.contains("json");

        let value = if structured {
            mh_core::parse_yaml(&raw).map_err(|e| EngineError::Datasource {
                name: name.to_string(),
                message: format!("cannot parse body: {}", e),
            })?
        } else {
            JsonValue::String(raw.clone())
        };

        Ok(Self { raw, value })
    }
}

/// Resolves a datasource URL to its content
pub trait DatasourceFetcher: Send + Sync {
    fn fetch(&self, source: &Datasource) -> Result<Fetched>;
}

/// Fetcher for `file`, `env`, `http` and `https` URLs
#[derive(Debug, Default, Clone)]
pub struct DefaultFetcher;

impl DefaultFetcher {
    fn fetch_http(&self, source: &Datasource) -> Result<Fetched> {
        let fail = |message: String| EngineError::Datasource {
            name: source.name.clone(),
            message,
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| fail(e.to_string()))?;

        let mut request = client.get(source.url.clone());
        for (key, value) in &source.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().map_err(|e| fail(e.to_string()))?;

        Fetched::parse(&source.name, body, &source.url, content_type.as_deref())
    }
}

impl DatasourceFetcher for DefaultFetcher {
    fn fetch(&self, source: &Datasource) -> Result<Fetched> {
        tracing::debug!(datasource = %source.name, url = %source.url, "Fetching datasource");

        match source.url.scheme() {
            "file" => {
                let path = source.url.to_file_path().map_err(|_| EngineError::Datasource {
                    name: source.name.clone(),
                    message: format!("invalid file URL {}", source.url),
                })?;
                let raw = std::fs::read_to_string(&path).map_err(|e| EngineError::Datasource {
                    name: source.name.clone(),
                    message: format!("cannot read {}: {}", path.display(), e),
                })?;
                Fetched::parse(&source.name, raw, &source.url, None)
            }
            "env" => {
                let var = source.url.path().trim_start_matches('/');
                let raw = std::env::var(var).map_err(|e| EngineError::Datasource {
                    name: source.name.clone(),
                    message: format!("{}: {}", var, e),
                })?;
                Fetched::parse(&source.name, raw, &source.url, None)
            }
            "http" | "https" => self.fetch_http(source),
            other => Err(EngineError::Datasource {
                name: source.name.clone(),
                message: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

/// Fetched datasources by name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Datasources(IndexMap<String, Fetched>);

impl Datasources {
    /// Fetch every declared datasource, failing on the first error
    pub fn load(
        config: &SelfRenderConfig,
        base_dir: &Path,
        fetcher: &dyn DatasourceFetcher,
    ) -> Result<Self> {
        let mut fetched = IndexMap::new();
        for source in config.declarations(base_dir)? {
            let data = fetcher.fetch(&source)?;
            fetched.insert(source.name, data);
        }
        Ok(Self(fetched))
    }

    pub fn get(&self, name: &str) -> Option<&Fetched> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_named_and_bare() {
        let named = Datasource::parse("cfg=https://example.com/a.json?x=1", Path::new("/")).unwrap();
        assert_eq!(named.name, "cfg");
        assert_eq!(named.url.as_str(), "https://example.com/a.json?x=1");

        let bare = Datasource::parse("file:///etc/settings.yaml", Path::new("/")).unwrap();
        assert_eq!(bare.name, "settings");
        assert_eq!(bare.url.scheme(), "file");
    }

    #[test]
    fn test_parse_relative_path() {
        let source = Datasource::parse("data/site.yaml", Path::new("/srv/mh")).unwrap();
        assert_eq!(source.name, "site");
        assert_eq!(source.url.as_str(), "file:///srv/mh/data/site.yaml");
    }

    #[test]
    fn test_headers_attach_to_declaration() {
        let config = SelfRenderConfig {
            datasources: vec!["api=https://example.com/v1".to_string()],
            datasource_headers: vec!["api=Authorization: Bearer t0k".to_string()],
        };
        let declared = config.declarations(Path::new("/")).unwrap();
        assert_eq!(
            declared[0].headers,
            vec![("Authorization".to_string(), "Bearer t0k".to_string())]
        );

        let orphan = SelfRenderConfig {
            datasources: vec![],
            datasource_headers: vec!["nope=X-A: b".to_string()],
        };
        assert!(orphan.declarations(Path::new("/")).is_err());
    }

    #[test]
    fn test_from_document() {
        let doc = json!({"selfRender": {"datasources": ["a=env:HOME"]}, "other": 1});
        let config = SelfRenderConfig::from_document(&doc).unwrap();
        assert_eq!(config.datasources, vec!["a=env:HOME".to_string()]);
        assert!(SelfRenderConfig::from_document(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_from_document_gomplate_key() {
        let doc = json!({
            "gomplate": {
                "datasources": ["site=https://example.com/site.yaml"],
                "datasourceHeaders": ["site=Authorization: token x"],
            }
        });
        let config = SelfRenderConfig::from_document(&doc).unwrap();
        assert_eq!(config.datasources.len(), 1);
        assert_eq!(config.datasource_headers.len(), 1);

        let doc = json!({
            "selfRender": {"datasources": ["a=env:HOME"]},
            "gomplate": {"datasources": ["b=env:USER"]},
        });
        let config = SelfRenderConfig::from_document(&doc).unwrap();
        assert_eq!(config.datasources, vec!["a=env:HOME".to_string()]);
    }

    #[test]
    fn test_fetch_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.yaml"), "region: eu\nzones: [a, b]\n").unwrap();
        std::fs::write(dir.path().join("motd.txt"), "hello\n").unwrap();

        let config = SelfRenderConfig {
            datasources: vec!["site.yaml".to_string(), "msg=motd.txt".to_string()],
            datasource_headers: vec![],
        };
        let sources = Datasources::load(&config, dir.path(), &DefaultFetcher).unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get("site").unwrap().value["region"], json!("eu"));
        assert_eq!(sources.get("msg").unwrap().value, json!("hello\n"));
        assert_eq!(sources.names().collect::<Vec<_>>(), vec!["site", "msg"]);
    }

    #[test]
    fn test_fetch_env() {
        let path = std::env::var("PATH").unwrap_or_default();
        let source = Datasource::parse("p=env:PATH", Path::new("/")).unwrap();
        let fetched = DefaultFetcher.fetch(&source).unwrap();
        assert_eq!(fetched.raw, path);
    }

    #[test]
    fn test_missing_file_is_datasource_error() {
        let dir = TempDir::new().unwrap();
        let source = Datasource::parse("gone=missing.json", dir.path()).unwrap();
        let err = DefaultFetcher.fetch(&source).unwrap_err();
        assert!(matches!(err, EngineError::Datasource { ref name, .. } if name == "gone"));
    }

    #[test]
    fn test_unsupported_scheme() {
        let source = Datasource::parse("x=ftp://example.com/a", Path::new("/")).unwrap();
        assert!(DefaultFetcher.fetch(&source).is_err());
    }
}
