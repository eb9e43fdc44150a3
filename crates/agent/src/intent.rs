/// The three-way classification of an inbound question.
///
/// Classification is a substring test over an uppercased model reply. The
/// variant order below is also the test order, and it matters: a reply
/// containing both tokens resolves to [`Intent::PriceComparison`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    PriceComparison,
    CreatePass,
    GeneralQuestion,
}

impl Intent {
    pub fn classify(model_reply: &str) -> Self {
        let normalized = model_reply.trim().to_uppercase();

        if normalized.contains("PRICE_COMPARISON") {
            return Self::PriceComparison;
        }
        if normalized.contains("CREATE_PASS") {
            return Self::CreatePass;
        }
        Self::GeneralQuestion
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceComparison => "PRICE_COMPARISON",
            Self::CreatePass => "CREATE_PASS",
            Self::GeneralQuestion => "GENERAL_QUESTION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn classifies_each_label() {
        assert_eq!(Intent::classify("PRICE_COMPARISON"), Intent::PriceComparison);
        assert_eq!(Intent::classify("CREATE_PASS"), Intent::CreatePass);
        assert_eq!(Intent::classify("GENERAL_QUESTION"), Intent::GeneralQuestion);
    }

    #[test]
    fn tolerates_chatty_replies_and_casing() {
        assert_eq!(
            Intent::classify("The intent here is clearly price_comparison."),
            Intent::PriceComparison
        );
        assert_eq!(Intent::classify("  Intent: Create_Pass\n"), Intent::CreatePass);
    }

    #[test]
    fn price_comparison_wins_when_both_tokens_appear() {
        assert_eq!(
            Intent::classify("Could be CREATE_PASS or PRICE_COMPARISON"),
            Intent::PriceComparison
        );
        assert_eq!(
            Intent::classify("PRICE_COMPARISON CREATE_PASS"),
            Intent::PriceComparison
        );
    }

    #[test]
    fn unknown_replies_default_to_general_question() {
        assert_eq!(Intent::classify("no idea"), Intent::GeneralQuestion);
        assert_eq!(Intent::classify(""), Intent::GeneralQuestion);
    }
}
