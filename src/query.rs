//! Query strings as submitted by the search forms.

use kstring::KString;

use crate::path_codec::{url_encode, url_decode, UrlDecodingError};

/// Flat list of key/value pairs, in the order given. Keys may repeat;
/// lookups see the first occurrence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryString(Vec<(KString, KString)>);

impl From<&QueryString> for String {
    fn from(q: &QueryString) -> Self {
        let mut s = String::new();
        let mut is_first = true;
        for (k, v) in &q.0 {
            if is_first {
                is_first = false;
            } else {
                s.push('&');
            }
            s.push_str(&url_encode(&k));
            s.push('=');
            s.push_str(&url_encode(&v));
        }
        s
    }
}

// Forms encode spaces as `+`; percent-decoding alone leaves them.
fn form_decode(s: &str) -> Result<KString, UrlDecodingError> {
    if s.contains('+') {
        url_decode(&s.replace('+', " ")).map(KString::from_string)
    } else {
        url_decode(s).map(KString::from_string)
    }
}

impl QueryString {
    pub fn new(keyvals: &[(&str, &str)]) -> Self {
        Self(keyvals.iter().map(
            |(k, v)| (KString::from_ref(k), KString::from_ref(v))).collect())
    }

    pub fn from_str(s: &str) -> Result<Self, UrlDecodingError> {
        let mut v = Vec::new();
        for partraw in s.split('&') {
            if ! partraw.is_empty() {
                if let Some((key, val)) = partraw.split_once('=') {
                    v.push((form_decode(key)?, form_decode(val)?));
                } else {
                    v.push((form_decode(partraw)?, KString::from_static("")));
                }
            }
        }
        Ok(QueryString(v))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.as_str())
    }
}
