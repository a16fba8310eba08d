//! Upload acceptance policy.

use std::path::Path;

use qrshare_shared::config::UploadSettings;

use super::error::UploadError;
use super::types::{UploadRequest, ValidatedUpload};

const OCTET_STREAM: &str = "application/octet-stream";

/// Deployment-defined limits on what may be uploaded.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Largest accepted payload in bytes (inclusive).
    pub max_bytes: u64,
    /// Accepted media type prefixes, lowercase.
    pub allowed_mime_prefixes: Vec<String>,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    /// Create a policy, normalizing the accepted sets to lowercase.
    #[must_use]
    pub fn new(
        max_bytes: u64,
        allowed_mime_prefixes: impl IntoIterator<Item = impl AsRef<str>>,
        allowed_extensions: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            max_bytes,
            allowed_mime_prefixes: allowed_mime_prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Check a received upload against the policy.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payload is empty
    /// - The payload exceeds `max_bytes`
    /// - Neither the media type nor the extension is accepted
    pub fn validate(&self, request: UploadRequest) -> Result<ValidatedUpload, UploadError> {
        let size = request.size();
        if size == 0 {
            return Err(UploadError::EmptyFile);
        }
        if size > self.max_bytes {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let content_type = resolve_content_type(request.content_type.as_deref(), &request.file_name);
        if !self.is_type_allowed(&content_type, &request.file_name) {
            return Err(UploadError::UnsupportedType {
                mime_type: content_type,
            });
        }

        Ok(ValidatedUpload {
            file_name: request.file_name,
            content_type,
            payload: request.payload,
        })
    }

    /// Whether a media type or file extension is in the accepted set.
    #[must_use]
    pub fn is_type_allowed(&self, content_type: &str, file_name: &str) -> bool {
        let mime_ok = self
            .allowed_mime_prefixes
            .iter()
            .any(|prefix| content_type.starts_with(prefix.as_str()));

        mime_ok
            || extension(file_name)
                .is_some_and(|ext| self.allowed_extensions.iter().any(|e| *e == ext))
    }
}

impl From<&UploadSettings> for UploadPolicy {
    fn from(settings: &UploadSettings) -> Self {
        Self::new(
            settings.max_bytes,
            &settings.allowed_mime_prefixes,
            &settings.allowed_extensions,
        )
    }
}

/// Media type to store a file with.
///
/// Parameters are stripped and the type lowercased. A missing or generic
/// `application/octet-stream` type is guessed from the file name instead.
#[must_use]
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    let declared = declared
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != OCTET_STREAM);

    declared.unwrap_or_else(|| {
        mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string()
    })
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn policy(max_bytes: u64) -> UploadPolicy {
        UploadPolicy::from(&UploadSettings {
            max_bytes,
            ..UploadSettings::default()
        })
    }

    fn request(name: &str, content_type: Option<&str>, len: usize) -> UploadRequest {
        UploadRequest::new(name, content_type.map(String::from), vec![b'x'; len])
    }

    #[test]
    fn test_zero_byte_file_rejected() {
        let err = policy(1024)
            .validate(request("a.txt", Some("text/plain"), 0))
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        let policy = policy(1024);
        assert!(policy.validate(request("a.txt", Some("text/plain"), 1024)).is_ok());

        let err = policy
            .validate(request("a.txt", Some("text/plain"), 1025))
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::FileTooLarge {
                size: 1025,
                max: 1024
            }
        ));
    }

    #[rstest]
    #[case("photo.jpg", Some("image/jpeg"), "image/jpeg")]
    #[case("scan.pdf", Some("application/pdf"), "application/pdf")]
    #[case("notes.txt", Some("text/plain; charset=utf-8"), "text/plain")]
    #[case("PHOTO.PNG", None, "image/png")]
    #[case("doc.pdf", Some("application/octet-stream"), "application/pdf")]
    #[case("img.webp", Some("IMAGE/WEBP"), "image/webp")]
    fn test_accepted_types(
        #[case] name: &str,
        #[case] declared: Option<&str>,
        #[case] resolved: &str,
    ) {
        let upload = policy(1024)
            .validate(request(name, declared, 10))
            .expect("accepted");
        assert_eq!(upload.content_type, resolved);
        assert_eq!(upload.file_name, name);
    }

    #[rstest]
    #[case("run.exe", Some("application/x-msdownload"))]
    #[case("page.html", Some("text/html"))]
    #[case("blob", None)]
    fn test_rejected_types(#[case] name: &str, #[case] declared: Option<&str>) {
        let err = policy(1024).validate(request(name, declared, 10)).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
    }

    #[test]
    fn test_allowed_extension_accepts_unlisted_type() {
        let policy = UploadPolicy::new(1024, ["image/"], [".TXT"]);
        assert!(policy.validate(request("readme.txt", Some("text/x-readme"), 3)).is_ok());
        assert!(policy.validate(request("readme.md", Some("text/markdown"), 3)).is_err());
    }

    #[test]
    fn test_resolve_content_type_unknown_extension() {
        assert_eq!(resolve_content_type(None, "blob"), OCTET_STREAM);
        assert_eq!(resolve_content_type(Some(""), "a.png"), "image/png");
    }

    proptest! {
        #[test]
        fn prop_size_validation(max in 1u64..4096, len in 0usize..8192) {
            let result = policy(max).validate(request("a.txt", Some("text/plain"), len));
            let len = len as u64;
            if len == 0 {
                prop_assert!(matches!(result, Err(UploadError::EmptyFile)));
            } else if len <= max {
                prop_assert!(result.is_ok());
            } else {
                let too_large = matches!(result, Err(UploadError::FileTooLarge { .. }));
                prop_assert!(too_large);
            }
        }
    }
}
