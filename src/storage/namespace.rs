//! Public bucket URL construction

use crate::config::StorageConfig;

/// Public object-storage area candidate document URLs are built against
#[derive(Debug, Clone)]
pub struct StorageNamespace {
    public_url: String,
    bucket: String,
}

impl StorageNamespace {
    pub fn new(public_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.public_url, &config.bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of an object in the bucket
    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.public_url,
            self.bucket,
            urlencoding::encode(object_name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_encodes_object_name() {
        let namespace = StorageNamespace::new("https://abc.supabase.co/", "books");
        assert_eq!(
            namespace.public_url("Untitled Notes.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/books/Untitled%20Notes.pdf"
        );
    }
}
