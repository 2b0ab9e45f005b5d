//! Registry reference parsing
//!
//! A repository reference is `<registry>/<repository>`, where the registry is
//! a `host[:port]` and the repository follows the distribution name grammar.
//! A subject reference inside that repository is either a tag or a digest.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::digest::Digest;
use crate::error::{ArtifactError, ArtifactResult};

static REPOSITORY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*)*$",
    )
    .expect("static regex is valid")
});

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("static regex is valid"));

/// Repository within a registry (`registry/repository`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    registry: String,
    repository: String,
}

impl RepositoryReference {
    /// Join a registry host and a repository name and validate the result
    ///
    /// # Errors
    /// Returns `InvalidReference` if the joined string is not well formed
    pub fn new(registry: &str, repository: &str) -> ArtifactResult<Self> {
        format!("{}/{}", registry, repository).parse()
    }

    /// Registry host, including the port if one was given
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Repository path within the registry
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Fully qualified reference to an artifact in this repository
    pub fn qualify(&self, reference: &SubjectReference) -> String {
        match reference {
            SubjectReference::Tag(tag) => format!("{}:{}", self, tag),
            SubjectReference::Digest(digest) => format!("{}@{}", self, digest),
        }
    }
}

fn validate_registry(registry: &str) -> ArtifactResult<()> {
    let invalid = || ArtifactError::InvalidReference(format!("invalid registry: {:?}", registry));

    if registry.is_empty() {
        return Err(invalid());
    }

    let url = Url::parse(&format!("dummy://{}", registry)).map_err(|_| invalid())?;
    let plain_host = url.host_str().map_or(false, |host| !host.is_empty())
        && url.username().is_empty()
        && url.password().is_none()
        && url.path().is_empty()
        && url.query().is_none()
        && url.fragment().is_none();

    if plain_host {
        Ok(())
    } else {
        Err(invalid())
    }
}

impl FromStr for RepositoryReference {
    type Err = ArtifactError;

    fn from_str(s: &str) -> ArtifactResult<Self> {
        let (registry, repository) = s.split_once('/').ok_or_else(|| {
            ArtifactError::InvalidReference(format!("missing repository: {:?}", s))
        })?;

        validate_registry(registry)?;

        if !REPOSITORY_NAME.is_match(repository) {
            return Err(ArtifactError::InvalidReference(format!(
                "invalid repository name: {:?}",
                repository
            )));
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
        })
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

/// Tag or digest identifying an artifact within a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectReference {
    /// Mutable tag, resolved by the registry
    Tag(String),
    /// Content digest
    Digest(Digest),
}

impl SubjectReference {
    /// Digest named by the reference, if it is one
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            SubjectReference::Digest(digest) => Some(digest),
            SubjectReference::Tag(_) => None,
        }
    }
}

impl FromStr for SubjectReference {
    type Err = ArtifactError;

    fn from_str(s: &str) -> ArtifactResult<Self> {
        if Digest::is_digest_like(s) {
            return s
                .parse()
                .map(SubjectReference::Digest)
                .map_err(|e| ArtifactError::InvalidReference(format!("{}: {}", s, e)));
        }

        if TAG.is_match(s) {
            Ok(SubjectReference::Tag(s.to_string()))
        } else {
            Err(ArtifactError::InvalidReference(format!("invalid tag: {:?}", s)))
        }
    }
}

impl fmt::Display for SubjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectReference::Tag(tag) => f.write_str(tag),
            SubjectReference::Digest(digest) => write!(f, "{}", digest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_reference() {
        let reference = RepositoryReference::new("myregistry.example.com", "team/app").unwrap();
        assert_eq!(reference.registry(), "myregistry.example.com");
        assert_eq!(reference.repository(), "team/app");
        assert_eq!(reference.to_string(), "myregistry.example.com/team/app");
    }

    #[test]
    fn test_registry_with_port() {
        let reference = RepositoryReference::new("localhost:5000", "app").unwrap();
        assert_eq!(reference.registry(), "localhost:5000");
    }

    #[test]
    fn test_invalid_repository_names() {
        for repository in ["", "App", "app:v1", "app@sha256:00", "/app", "app/", "a..b"] {
            let err = RepositoryReference::new("registry.example.com", repository).unwrap_err();
            assert!(
                matches!(err, ArtifactError::InvalidReference(_)),
                "{:?} should be rejected",
                repository
            );
        }
    }

    #[test]
    fn test_invalid_registries() {
        for registry in ["", "user:pass@host", "host:notaport", "host?x=1"] {
            assert!(
                RepositoryReference::new(registry, "app").is_err(),
                "{:?} should be rejected",
                registry
            );
        }
    }

    #[test]
    fn test_repository_separators() {
        assert!(RepositoryReference::new("r.io", "a.b_c__d-e--f/g").is_ok());
    }

    #[test]
    fn test_subject_tag() {
        let reference: SubjectReference = "v1.2.3".parse().unwrap();
        assert_eq!(reference, SubjectReference::Tag("v1.2.3".to_string()));
        assert!(reference.digest().is_none());
    }

    #[test]
    fn test_subject_digest() {
        let digest = Digest::from_bytes(b"subject");
        let reference: SubjectReference = digest.to_string().parse().unwrap();
        assert_eq!(reference.digest(), Some(&digest));
    }

    #[test]
    fn test_subject_invalid() {
        assert!("-leading-dash".parse::<SubjectReference>().is_err());
        assert!("sha256:short".parse::<SubjectReference>().is_err());
        assert!("a".repeat(129).parse::<SubjectReference>().is_err());
    }

    #[test]
    fn test_qualify() {
        let repo = RepositoryReference::new("r.io", "app").unwrap();
        let tag = SubjectReference::Tag("latest".to_string());
        assert_eq!(repo.qualify(&tag), "r.io/app:latest");

        let digest = Digest::from_bytes(b"");
        let by_digest = SubjectReference::Digest(digest.clone());
        assert_eq!(repo.qualify(&by_digest), format!("r.io/app@{}", digest));
    }
}
