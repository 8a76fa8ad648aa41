/// Errors raised while mapping the embedded XML document
#[derive(Debug, thiserror::Error)]
pub enum CziError {
    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Metadata payload is not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Document ended with elements still open
    #[error("Unclosed element <{0}> at end of metadata document")]
    UnclosedElement(String),

    /// Declared XML size does not fit the segment payload
    #[error("Metadata XML size {declared} exceeds segment payload of {available} bytes")]
    XmlSizeOutOfBounds {
        /// Size declared in the segment
        declared: u64,
        /// Bytes available after the XML offset
        available: usize,
    },
}

impl From<quick_xml::events::attributes::AttrError> for CziError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        CziError::XmlError(quick_xml::Error::from(e))
    }
}
