//! Inquiry Aggregate

text_enum! {
    InquiryKind {
        General => "general",
        Preorder => "preorder",
        Commission => "commission",
    }
}

text_enum! {
    InquiryStatus {
        New => "new",
        Contacted => "contacted",
        Closed => "closed",
    }
}

impl InquiryKind {
    /// Preorders name the piece being asked about.
    pub fn requires_artwork(&self) -> bool { matches!(self, Self::Preorder) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_artwork_rule() {
        assert_eq!("preorder".parse::<InquiryKind>(), Ok(InquiryKind::Preorder));
        assert!("wholesale".parse::<InquiryKind>().is_err());
        assert!(InquiryKind::Preorder.requires_artwork());
        assert!(!InquiryKind::Commission.requires_artwork());
        assert_eq!(InquiryStatus::ALL.len(), 3);
    }
}
