/// Header fields of one fetched message, kept as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageObservation {
    pub subject: String,
    pub from_field: String,
    pub to_field: String,
    pub cc_field: String,
    pub date: String,
}

impl MessageObservation {
    /// Builds an observation from `(name, value)` header pairs. Names match
    /// case-insensitively and the first occurrence of each header wins.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut observation = Self::default();
        let mut seen = [false; 5];
        for (name, value) in headers {
            let slot = match name.trim().to_ascii_lowercase().as_str() {
                "subject" => 0,
                "from" => 1,
                "to" => 2,
                "cc" => 3,
                "date" => 4,
                _ => continue,
            };
            if seen[slot] {
                continue;
            }
            seen[slot] = true;
            let value = value.trim().to_string();
            match slot {
                0 => observation.subject = value,
                1 => observation.from_field = value,
                2 => observation.to_field = value,
                3 => observation.cc_field = value,
                _ => observation.date = value,
            }
        }
        observation
    }
}

#[cfg(test)]
mod tests {
    use super::MessageObservation;

    #[test]
    fn from_headers_matches_names_case_insensitively() {
        let observation = MessageObservation::from_headers([
            ("SUBJECT", "Kickoff"),
            ("from", "Ada <ada@example.com>"),
            ("To", "bob@example.com, carol@example.com"),
            ("X-Mailer", "ignored"),
            ("Date", " Tue, 1 Oct 2024 10:00:00 +0000 "),
        ]);
        assert_eq!(observation.subject, "Kickoff");
        assert_eq!(observation.from_field, "Ada <ada@example.com>");
        assert_eq!(observation.to_field, "bob@example.com, carol@example.com");
        assert_eq!(observation.cc_field, "");
        assert_eq!(observation.date, "Tue, 1 Oct 2024 10:00:00 +0000");
    }

    #[test]
    fn from_headers_keeps_first_occurrence() {
        let observation =
            MessageObservation::from_headers([("Subject", "first"), ("Subject", "second")]);
        assert_eq!(observation.subject, "first");
    }
}
