use hyper::header::{HeaderMap, HeaderName, HeaderValue};

/// HTTP response headers with case-insensitive names and multi-value support.
///
/// Backed by a [`HeaderMap`], so lookups ignore case and repeated headers
/// (notably `Set-Cookie`) keep every value. Invalid names or values are
/// silently dropped on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    inner: HeaderMap,
}

impl Headers {
    /// Creates an empty header collection.
    pub fn new() -> Self {
        Self {
            inner: HeaderMap::new(),
        }
    }

    /// Inserts a single header value, replacing any existing values.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_ref().as_bytes()),
            HeaderValue::from_bytes(value.as_ref().as_bytes()),
        ) {
            self.inner.insert(name, value);
        }
    }

    /// Appends a header value, preserving existing values.
    pub fn append<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_ref().as_bytes()),
            HeaderValue::from_bytes(value.as_ref().as_bytes()),
        ) {
            self.inner.append(name, value);
        }
    }

    /// Gets the first value for a header.
    pub fn get<K>(&self, key: K) -> Option<&str>
    where
        K: AsRef<str>,
    {
        let name = HeaderName::from_bytes(key.as_ref().as_bytes()).ok()?;
        self.inner.get(&name)?.to_str().ok()
    }

    /// Gets all values for a header.
    pub fn get_all<K>(&self, key: K) -> Vec<&str>
    where
        K: AsRef<str>,
    {
        match HeaderName::from_bytes(key.as_ref().as_bytes()) {
            Ok(name) => self
                .inner
                .get_all(&name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Checks whether a header exists.
    pub fn contains_key<K>(&self, key: K) -> bool
    where
        K: AsRef<str>,
    {
        HeaderName::from_bytes(key.as_ref().as_bytes())
            .ok()
            .map(|name| self.inner.contains_key(&name))
            .unwrap_or(false)
    }

    /// Removes a header completely, returning the first value if present.
    pub fn remove<K>(&mut self, key: K) -> Option<String>
    where
        K: AsRef<str>,
    {
        let name = HeaderName::from_bytes(key.as_ref().as_bytes()).ok()?;
        self.inner.remove(&name)?.to_str().ok().map(String::from)
    }

    /// The unique header names present.
    pub fn keys(&self) -> Vec<&str> {
        self.inner.keys().map(HeaderName::as_str).collect()
    }

    /// Number of values stored (repeated headers count each value).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no headers are set.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over every `(name, value)` pair, names repeated for
    /// multi-value headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
    }

    pub(crate) fn into_inner(self) -> HeaderMap {
        self.inner
    }
}
