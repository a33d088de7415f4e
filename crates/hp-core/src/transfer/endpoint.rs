//! Copy endpoint parsing and validation

use std::fmt;
use std::path::PathBuf;

use crate::error::TransferError;

/// One side of a copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A path on this machine
    Local(PathBuf),
    /// A path on a host (or on every host with a tag)
    Remote { identifier: String, path: String },
}

impl Endpoint {
    /// Parse `IDENTIFIER:PATH` or a local path.
    ///
    /// The identifier is the non-empty text before the first `:` and may not
    /// contain `/`, so `./a:b` and `/tmp/x:y` stay local. An empty remote
    /// path means the remote working directory.
    pub fn parse(raw: &str) -> Self {
        if let Some((identifier, path)) = raw.split_once(':') {
            if !identifier.is_empty() && !identifier.contains('/') {
                let path = if path.is_empty() { "." } else { path };
                return Endpoint::Remote {
                    identifier: identifier.to_string(),
                    path: path.to_string(),
                };
            }
        }
        Endpoint::Local(PathBuf::from(raw))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Endpoint::Remote { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local(path) => write!(f, "{}", path.display()),
            Endpoint::Remote { identifier, path } => write!(f, "{}:{}", identifier, path),
        }
    }
}

/// A remote endpoint split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Host name, or tag in group mode
    pub identifier: String,
    pub path: String,
}

/// A validated copy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyPlan {
    /// Local sources to one host or a tag
    Upload { sources: Vec<PathBuf>, destination: RemotePath },
    /// One remote source (a host or a tag) to a local destination
    Download { source: RemotePath, destination: PathBuf },
    /// Remote sources to a remote destination, staged locally
    Relay { sources: Vec<RemotePath>, destination: RemotePath },
}

impl CopyPlan {
    /// Classify and validate raw `cp` arguments
    pub fn parse<S: AsRef<str>>(sources: &[S], destination: &str, group: bool) -> Result<Self, TransferError> {
        let sources: Vec<Endpoint> = sources.iter().map(|s| Endpoint::parse(s.as_ref())).collect();
        Self::new(sources, Endpoint::parse(destination), group)
    }

    pub fn new(sources: Vec<Endpoint>, destination: Endpoint, group: bool) -> Result<Self, TransferError> {
        let invalid = |msg: &str| Err(TransferError::InvalidEndpoint(msg.to_string()));

        if sources.is_empty() {
            return invalid("at least one source and a destination are required");
        }

        let remote_sources = sources.iter().filter(|s| s.is_remote()).count();
        let all_local = remote_sources == 0;
        let all_remote = remote_sources == sources.len();

        match destination {
            Endpoint::Remote { identifier, path } if all_local => Ok(CopyPlan::Upload {
                sources: sources.into_iter().filter_map(local_path).collect(),
                destination: RemotePath { identifier, path },
            }),
            Endpoint::Remote { identifier, path } if all_remote => {
                if group {
                    return invalid("group mode cannot copy between remote hosts");
                }
                Ok(CopyPlan::Relay {
                    sources: sources.into_iter().filter_map(remote_path).collect(),
                    destination: RemotePath { identifier, path },
                })
            }
            Endpoint::Remote { .. } => invalid("sources must be all local or all remote"),
            Endpoint::Local(destination) if all_remote => {
                if sources.len() != 1 {
                    return invalid("download takes exactly one remote source");
                }
                let source = sources
                    .into_iter()
                    .find_map(remote_path)
                    .ok_or_else(|| TransferError::InvalidEndpoint("missing remote source".into()))?;
                Ok(CopyPlan::Download { source, destination })
            }
            Endpoint::Local(_) if all_local => invalid("at least one endpoint must be remote"),
            Endpoint::Local(_) => invalid("a local destination takes exactly one remote source"),
        }
    }
}

fn local_path(endpoint: Endpoint) -> Option<PathBuf> {
    match endpoint {
        Endpoint::Local(path) => Some(path),
        Endpoint::Remote { .. } => None,
    }
}

fn remote_path(endpoint: Endpoint) -> Option<RemotePath> {
    match endpoint {
        Endpoint::Remote { identifier, path } => Some(RemotePath { identifier, path }),
        Endpoint::Local(_) => None,
    }
}

/// Last component of a `/` separated remote path
pub(crate) fn remote_basename(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Join a name onto a remote directory
pub(crate) fn remote_join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(identifier: &str, path: &str) -> Endpoint {
        Endpoint::Remote {
            identifier: identifier.into(),
            path: path.into(),
        }
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(Endpoint::parse("db1:/etc/hosts"), remote("db1", "/etc/hosts"));
        assert_eq!(Endpoint::parse("db1:"), remote("db1", "."));
        assert_eq!(Endpoint::parse("web:a:b"), remote("web", "a:b"));
        assert_eq!(Endpoint::parse("./a:b"), Endpoint::Local("./a:b".into()));
        assert_eq!(Endpoint::parse("/tmp/x:y"), Endpoint::Local("/tmp/x:y".into()));
        assert_eq!(Endpoint::parse(":oops"), Endpoint::Local(":oops".into()));
        assert_eq!(Endpoint::parse("notes.txt"), Endpoint::Local("notes.txt".into()));
    }

    #[test]
    fn test_upload_plan() {
        let plan = CopyPlan::parse(&["a.txt", "dir"], "web:/srv/", true).unwrap();
        assert_eq!(
            plan,
            CopyPlan::Upload {
                sources: vec!["a.txt".into(), "dir".into()],
                destination: RemotePath {
                    identifier: "web".into(),
                    path: "/srv/".into()
                },
            }
        );
    }

    #[test]
    fn test_download_plan() {
        let plan = CopyPlan::parse(&["db1:/var/log/syslog"], "logs", false).unwrap();
        assert!(matches!(plan, CopyPlan::Download { ref destination, .. } if destination == &PathBuf::from("logs")));
    }

    #[test]
    fn test_relay_plan() {
        let plan = CopyPlan::parse(&["db1:/a", "db2:/b"], "web1:/tmp", false).unwrap();
        match plan {
            CopyPlan::Relay { sources, destination } => {
                let ids: Vec<_> = sources.iter().map(|s| s.identifier.as_str()).collect();
                assert_eq!(ids, vec!["db1", "db2"]);
                assert_eq!(destination.identifier, "web1");
                assert_eq!(destination.path, "/tmp");
            }
            other => panic!("expected relay, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_plans() {
        let cases: Vec<(Vec<&str>, &str, bool)> = vec![
            (vec![], "db1:/tmp", false),
            (vec!["a", "b"], "c", false),
            (vec!["a", "db1:/x"], "db2:/y", false),
            (vec!["db1:/a", "db2:/b"], "out", false),
            (vec!["db1:/a", "local"], "out", false),
            (vec!["db1:/a"], "db2:/b", true),
        ];
        for (sources, destination, group) in cases {
            assert!(
                matches!(
                    CopyPlan::parse(&sources, destination, group),
                    Err(TransferError::InvalidEndpoint(_))
                ),
                "{:?} -> {} should be rejected",
                sources,
                destination
            );
        }
    }

    #[test]
    fn test_remote_path_helpers() {
        assert_eq!(remote_basename("/var/log/syslog"), Some("syslog"));
        assert_eq!(remote_basename("/var/log/"), Some("log"));
        assert_eq!(remote_basename("."), None);
        assert_eq!(remote_basename("/"), None);
        assert_eq!(remote_join("/srv", "a.txt"), "/srv/a.txt");
        assert_eq!(remote_join("/srv/", "a.txt"), "/srv/a.txt");
    }
}
