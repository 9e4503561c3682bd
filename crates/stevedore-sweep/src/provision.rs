//! One-shot category and RSS rule setup against the client.
//!
//! Both operations are create-if-absent: existing categories and rules are
//! left untouched so manual edits on the client survive reprovisioning.

use stevedore_config::{GenreProfile, RssTemplate};
use stevedore_qbit::{DownloadClient, RssRuleDef};
use tracing::info;

use crate::error::SweepResult;

/// Create the download category `name`, saving into the genre's target
/// directory, unless the client already has it.
///
/// # Errors
/// Returns an error when the client is unreachable or rejects the call.
pub async fn ensure_category(
    client: &dyn DownloadClient,
    genre: &GenreProfile,
    name: &str,
) -> SweepResult<()> {
    let categories = client.categories().await?;
    if categories.contains_key(name) {
        info!(category = name, "category already exists");
        return Ok(());
    }
    client.create_category(name, &genre.target_dir).await?;
    info!(
        category = name,
        path = %genre.target_dir.display(),
        "created category"
    );
    Ok(())
}

/// Create the genre's RSS auto-download rule for `name` unless a rule with
/// the same name already exists.
///
/// The rule is named `"<GENRE> - <name>"` with the genre key uppercased,
/// matches titles containing the name plus the template's suffix, and
/// assigns the `name` category so matched items land in the genre flow.
///
/// # Errors
/// Returns an error when the client is unreachable or rejects the call.
pub async fn ensure_rule(
    client: &dyn DownloadClient,
    genre_key: &str,
    genre: &GenreProfile,
    template: &RssTemplate,
    name: &str,
) -> SweepResult<()> {
    let rule_name = format!("{} - {}", genre_key.to_uppercase(), name);
    let existing = client.rss_rule_names().await?;
    if existing.iter().any(|rule| rule == &rule_name) {
        info!(rule = %rule_name, "rss rule already exists");
        return Ok(());
    }
    let rule = build_rule(genre, template, name);
    client.set_rss_rule(&rule_name, &rule).await?;
    info!(rule = %rule_name, must_contain = %rule.must_contain, "created rss rule");
    Ok(())
}

fn build_rule(genre: &GenreProfile, template: &RssTemplate, name: &str) -> RssRuleDef {
    let must_contain = if template.must_contain_suffix.is_empty() {
        name.to_string()
    } else {
        format!("{name} {}", template.must_contain_suffix)
    };
    let save_path = template
        .save_path
        .clone()
        .unwrap_or_else(|| genre.target_dir.join(name));
    RssRuleDef {
        enabled: true,
        must_contain,
        must_not_contain: template.must_not_contain.clone(),
        use_regex: template.use_regex,
        episode_filter: template.episode_filter.clone(),
        smart_filter: template.smart_filter,
        previously_matched_episodes: Vec::new(),
        affected_feeds: template.affected_feeds.clone(),
        ignore_days: template.ignore_days,
        last_match: String::new(),
        add_paused: template.add_paused,
        assigned_category: name.to_string(),
        save_path: save_path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use anyhow::Result;
    use stevedore_test_support::client::ScriptedClient;

    use super::*;

    type TestResult<T> = Result<T>;

    fn genre(target: &str) -> GenreProfile {
        GenreProfile {
            target_dir: PathBuf::from(target),
            preserve_structure: false,
            keep_extensions: Vec::new(),
            scan_library: false,
            delete_from_client: false,
            on_done: None,
            rss: None,
        }
    }

    fn template() -> RssTemplate {
        RssTemplate {
            must_contain_suffix: "1080p".to_string(),
            must_not_contain: "720p".to_string(),
            affected_feeds: vec!["https://example.org/rss".to_string()],
            save_path: None,
            use_regex: false,
            episode_filter: String::new(),
            smart_filter: false,
            add_paused: false,
            ignore_days: 0,
        }
    }

    #[tokio::test]
    async fn creates_a_missing_category_with_the_target_dir() -> TestResult<()> {
        let client = ScriptedClient::new();
        ensure_category(&client, &genre("/media/tv"), "weekly").await?;
        assert_eq!(
            client.created_categories().await,
            vec![("weekly".to_string(), PathBuf::from("/media/tv"))]
        );
        Ok(())
    }

    #[tokio::test]
    async fn existing_categories_are_left_untouched() -> TestResult<()> {
        let client = ScriptedClient::new().with_category("weekly", Path::new("/elsewhere"));
        ensure_category(&client, &genre("/media/tv"), "weekly").await?;
        assert!(client.created_categories().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn builds_the_rule_from_the_template() -> TestResult<()> {
        let client = ScriptedClient::new();
        ensure_rule(&client, "tv", &genre("/media/tv"), &template(), "Show").await?;

        let rules = client.rules().await;
        assert_eq!(rules.len(), 1);
        let (name, rule) = &rules[0];
        assert_eq!(name, "TV - Show");
        assert_eq!(rule.must_contain, "Show 1080p");
        assert_eq!(rule.must_not_contain, "720p");
        assert_eq!(rule.assigned_category, "Show");
        assert_eq!(rule.save_path, "/media/tv/Show");
        assert!(rule.enabled);
        assert!(rule.previously_matched_episodes.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn template_save_path_overrides_the_default() -> TestResult<()> {
        let client = ScriptedClient::new();
        let mut template = template();
        template.save_path = Some(PathBuf::from("/archive/tv"));
        ensure_rule(&client, "tv", &genre("/media/tv"), &template, "Show").await?;

        let rules = client.rules().await;
        assert_eq!(rules[0].1.save_path, "/archive/tv");
        Ok(())
    }

    #[tokio::test]
    async fn existing_rules_are_left_untouched() -> TestResult<()> {
        let client = ScriptedClient::new().with_rss_rule("TV - Show");
        ensure_rule(&client, "tv", &genre("/media/tv"), &template(), "Show").await?;
        assert!(client.rules().await.is_empty());
        Ok(())
    }
}
