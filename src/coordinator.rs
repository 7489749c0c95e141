//! Keeps a post's per-locale translations in step with its canonical content.

use crate::db::PostStore;
use crate::i18n::Locale;
use crate::models::{LocalizedText, Post, TranslatedPost, TranslationSnapshot};
use crate::translation::TranslationProvider;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a fan-out: the whole snapshot, or one locale's entry when a
/// specific locale was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FanOut {
    All(TranslationSnapshot),
    Single(LocalizedText),
}

pub struct PostTranslationCoordinator {
    store: Arc<dyn PostStore>,
    provider: Arc<dyn TranslationProvider>,
}

impl PostTranslationCoordinator {
    pub fn new(store: Arc<dyn PostStore>, provider: Arc<dyn TranslationProvider>) -> Self {
        Self { store, provider }
    }

    /// Translate `post` into every supported locale, upsert a translation row
    /// per non-canonical locale, then overwrite the post's snapshot.
    ///
    /// Locales are processed one after another in enumeration order. There is
    /// no surrounding transaction: if a row write fails, the error is returned
    /// and rows written for earlier locales stay in place. `post` is refreshed
    /// from the store once the snapshot is saved.
    pub async fn translate_and_persist(
        &self,
        post: &mut Post,
        locale: Option<Locale>,
    ) -> Result<FanOut> {
        let source = Locale::canonical();
        let mut snapshot = TranslationSnapshot::new();

        for target in Locale::ALL {
            if target == source {
                snapshot.insert(target, post.canonical());
                continue;
            }

            let title = self.provider.translate(&post.title, target, source).await;
            let content = self.provider.translate(&post.content, target, source).await;
            let text = LocalizedText { title, content };

            self.store.upsert_translation(post.id, target, &text).await?;
            debug!("Saved {} translation for post {}", target, post.id);

            snapshot.insert(target, text);
        }

        *post = self.store.save_snapshot(post.id, &snapshot).await?;
        info!(
            "Post {} translated into {} locales",
            post.id,
            snapshot.len()
        );

        if let Some(text) = locale.and_then(|locale| snapshot.get(locale)) {
            return Ok(FanOut::Single(text.clone()));
        }
        Ok(FanOut::All(snapshot))
    }

    /// Render `post` in `locale`.
    ///
    /// The canonical locale always comes from the post's own fields. Other
    /// locales use the stored row when there is one; otherwise the text is
    /// translated on the fly (through the cache) and not written back.
    pub async fn get_translated(&self, post: &Post, locale: Locale) -> Result<TranslatedPost> {
        if locale.is_canonical() {
            return Ok(TranslatedPost {
                title: post.title.clone(),
                content: post.content.clone(),
                locale,
            });
        }

        if let Some(row) = self.store.find_translation(post.id, locale).await? {
            return Ok(row.into());
        }

        debug!(
            "No stored {} translation for post {}, translating on the fly",
            locale, post.id
        );
        let source = Locale::canonical();
        Ok(TranslatedPost {
            title: self.provider.translate(&post.title, locale, source).await,
            content: self.provider.translate(&post.content, locale, source).await,
            locale,
        })
    }
}
