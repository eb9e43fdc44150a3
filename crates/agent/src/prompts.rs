//! Prompt templates. The wording tracks the behavior the handlers rely on
//! (label vocabulary, "return only JSON" constraints, grounding instructions),
//! so changes here should be mirrored in the handler tests.

use chrono::NaiveDate;

pub fn intent(question: &str) -> String {
    format!(
        "Analyze the user's request and classify its intent. The possible intents are:\n\
         - 'PRICE_COMPARISON': For any question about the price of an item, cost, or comparing prices.\n\
         - 'CREATE_PASS': For any request to generate a grocery list or pass.\n\
         - 'GENERAL_QUESTION': For any other question, especially about their past receipts.\n\n\
         User Request: \"{question}\"\n\
         Intent:"
    )
}

pub fn product_extraction(question: &str) -> String {
    format!(
        "From the following user question, extract just the name of the product or item they \
         are asking about. For example, from 'how much is an iphone 15 pro max 256gb these \
         days?', extract 'iphone 15 pro max 256gb'.\n\nQuestion: '{question}'"
    )
}

pub fn price_synthesis(question: &str, results_json: &str) -> String {
    format!(
        "You are a helpful price comparison assistant. A user asked: \"{question}\"\n\
         I performed a web search and found these results: {results_json}\n\
         Based *only* on these search results, provide a concise answer. Summarize the prices \
         found, mentioning the source website (from the 'title' or 'displayLink').\n\
         If the results do not contain specific prices, state that you couldn't find exact \
         pricing information but can provide the links. Do not make up information."
    )
}

pub fn pass_format(grocery_list: &str) -> String {
    format!(
        "Format the user's grocery list into a JSON object with a 'user_id' and a list of \
         'items', each with 'name' and optional 'quantity'.\n\
         User request: \"\"\"{grocery_list}\"\"\"\n\
         Return ONLY the JSON object."
    )
}

pub fn receipt_extraction(fallback_date: NaiveDate) -> String {
    let today = fallback_date.format("%Y-%m-%d");
    format!(
        "Analyze this receipt image and extract a JSON object with the following details.\n\
         - The `items` field should be a list of all items found on the receipt.\n\
         - Each item in the list should be an object with its own `name`, `price`, and `quantity`.\n\
         - Also include `purchase_date` and `purchase_place` for the overall receipt.\n\
         - If `purchase_date` is missing, use today's date: {today}.\n\
         - Return ONLY the JSON object without extra text or markdown.\n\n\
         Example format:\n\
         {{\n\
         \"items\": [\n\
             {{ \"name\": \"Milk\", \"price\": 2.50, \"quantity\": 1 }},\n\
             {{ \"name\": \"Bread\", \"price\": 1.75, \"quantity\": 2 }}\n\
         ],\n\
         \"purchase_date\": \"2025-07-27\",\n\
         \"purchase_place\": \"SuperMart\"\n\
         }}"
    )
}

pub fn receipt_qa(context_json: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant answering questions about receipts.\n\
         Context: {context_json}\n\
         User question: {question}\n\
         Answer based ONLY on the above data."
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    #[test]
    fn intent_prompt_lists_all_three_labels() {
        let prompt = super::intent("how much are eggs?");
        assert!(prompt.contains("PRICE_COMPARISON"));
        assert!(prompt.contains("CREATE_PASS"));
        assert!(prompt.contains("GENERAL_QUESTION"));
        assert!(prompt.contains("how much are eggs?"));
    }

    #[test]
    fn receipt_extraction_embeds_the_fallback_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 27).expect("valid date");
        let prompt = super::receipt_extraction(date);
        assert!(prompt.contains("use today's date: 2025-07-27"));
    }
}
