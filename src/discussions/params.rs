use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::ActingUser;
use crate::database::models::DiscussionParams;

/// Inbound create/update payload. Every field is optional and unchecked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscussionForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub tags: Option<Vec<String>>,
}

/// Accept `"tags": "x"` as well as `"tags": ["x", "y"]`
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|tags| match tags {
        OneOrMany::One(tag) => vec![tag],
        OneOrMany::Many(tags) => tags,
    }))
}

/// Map a payload plus the acting user onto the record handed to the store.
///
/// Fields are copied verbatim. The update path passes no user, which leaves
/// `author` absent so the store keeps the original.
pub fn discussion_params(form: &DiscussionForm, user: Option<&ActingUser>) -> DiscussionParams {
    DiscussionParams {
        title: form.title.clone(),
        description: form.description.clone(),
        author: user.map(|user| user.id),
        category: form.category.clone(),
        tags: form.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn acting() -> ActingUser {
        ActingUser {
            id: Uuid::new_v4(),
            name: "ada".into(),
        }
    }

    #[test]
    fn copies_fields_and_author() {
        let form: DiscussionForm = serde_json::from_value(json!({
            "title": "T",
            "description": "D",
            "category": "C",
            "tags": ["a", "b"]
        }))
        .unwrap();
        let user = acting();

        let params = discussion_params(&form, Some(&user));
        assert_eq!(params.title.as_deref(), Some("T"));
        assert_eq!(params.description.as_deref(), Some("D"));
        assert_eq!(params.category.as_deref(), Some("C"));
        assert_eq!(params.tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(params.author, Some(user.id));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let form: DiscussionForm = serde_json::from_value(json!({ "category": "X" })).unwrap();
        let params = discussion_params(&form, None);
        assert_eq!(
            params,
            DiscussionParams {
                category: Some("X".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn empty_strings_pass_through_unchecked() {
        let form: DiscussionForm = serde_json::from_value(json!({ "title": "" })).unwrap();
        assert_eq!(discussion_params(&form, None).title.as_deref(), Some(""));
    }

    #[test]
    fn single_tag_string_becomes_one_element_list() {
        let form: DiscussionForm = serde_json::from_value(json!({ "tags": "rust" })).unwrap();
        assert_eq!(form.tags, Some(vec!["rust".to_string()]));

        let form: DiscussionForm = serde_json::from_value(json!({ "tags": null })).unwrap();
        assert_eq!(form.tags, None);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let form: DiscussionForm = serde_json::from_value(json!({ "author": "someone", "views": 99 })).unwrap();
        assert_eq!(form, DiscussionForm::default());
    }
}
