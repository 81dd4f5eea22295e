//! Attach the source URL to a saved file as out-of-band metadata.

use std::io;
use std::path::Path;

pub trait SourceTagger {
    fn tag_source(&self, file: &Path, url: &str) -> io::Result<()>;
}

/// `user.source` extended attribute.
#[cfg(all(unix, not(target_os = "macos")))]
pub struct XattrTagger;

#[cfg(all(unix, not(target_os = "macos")))]
impl XattrTagger {
    pub const ATTR: &'static str = "user.source";
}

#[cfg(all(unix, not(target_os = "macos")))]
impl SourceTagger for XattrTagger {
    fn tag_source(&self, file: &Path, url: &str) -> io::Result<()> {
        xattr::set(file, Self::ATTR, url.as_bytes())
    }
}

/// Spotlight `kMDItemURL`, stored as a binary plist in the metadata xattr.
#[cfg(target_os = "macos")]
pub struct SpotlightTagger;

#[cfg(target_os = "macos")]
impl SpotlightTagger {
    pub const ATTR: &'static str = "com.apple.metadata:kMDItemURL";
}

#[cfg(target_os = "macos")]
impl SourceTagger for SpotlightTagger {
    fn tag_source(&self, file: &Path, url: &str) -> io::Result<()> {
        let mut value = Vec::new();
        plist::to_writer_binary(&mut value, &plist::Value::String(url.to_string()))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        xattr::set(file, Self::ATTR, &value)
    }
}

#[cfg_attr(unix, allow(dead_code))]
pub struct NoopTagger;

impl SourceTagger for NoopTagger {
    fn tag_source(&self, _file: &Path, _url: &str) -> io::Result<()> {
        Ok(())
    }
}

pub fn platform_tagger() -> Box<dyn SourceTagger> {
    #[cfg(target_os = "macos")]
    {
        Box::new(SpotlightTagger)
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Box::new(XattrTagger)
    }
    #[cfg(not(unix))]
    {
        Box::new(NoopTagger)
    }
}
