/// A Gradle version, ordered numerically by its dot-separated segments.
///
/// Only the numeric prefix participates in ordering; suffixes such as
/// `-rc-1` or `-milestone-2` are preserved verbatim for display but ignored
/// when comparing (a release compares equal to its release candidates, which
/// is good enough for capability checks).
#[derive(Debug, Clone)]
pub struct GradleVersion {
    version: String,
    segments: Vec<u32>,
}

impl PartialEq for GradleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for GradleVersion {}

impl std::hash::Hash for GradleVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Trailing zero segments are insignificant for equality; strip them
        // so the hash agrees with `Eq`.
        let mut end = self.segments.len();
        while end > 0 && self.segments[end - 1] == 0 {
            end -= 1;
        }
        self.segments[..end].hash(state);
    }
}

impl GradleVersion {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let numeric = text.split('-').next().unwrap_or(text);
        let mut segments = Vec::new();
        for part in numeric.split('.') {
            segments.push(part.parse::<u32>().ok()?);
        }

        Some(Self {
            version: text.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.version
    }

    /// True if this version is at least `major.minor`.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        let a = self.segments.first().copied().unwrap_or(0);
        let b = self.segments.get(1).copied().unwrap_or(0);
        (a, b) >= (major, minor)
    }
}

impl std::fmt::Display for GradleVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.version)
    }
}

impl PartialOrd for GradleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GradleVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                std::cmp::Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        std::cmp::Ordering::Equal
    }
}
