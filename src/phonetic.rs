// ============================================
// src/phonetic.rs
// 漢字まじりの文 → ひらがな 変換 (ベストエフォート)
// ============================================

use std::sync::Arc;

use lindera::dictionary::load_dictionary;
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer;
use tokio::sync::OnceCell;

use crate::error::ConversionError;
use crate::hiragana::{contains_kanji, katakana_to_hiragana_char};

/// 読みの解析器
pub trait ReadingAnalyzer: Send + Sync {
    fn to_hiragana(&self, text: &str) -> Result<String, ConversionError>;
}

// --------------------------------------------------
// 形態素解析による解析器
// --------------------------------------------------

/// バイナリに埋め込んだ IPADIC
const DICTIONARY_URI: &str = "embedded://ipadic";
/// IPADIC の素性のうち「読み」(カタカナ) の位置
const READING_FIELD: usize = 7;

/// lindera で単語に分けて、単語ごとの読みをつなげる
pub struct MorphologicalAnalyzer {
    tokenizer: Tokenizer,
}

impl MorphologicalAnalyzer {
    /// 辞書の展開に時間がかかるので spawn_blocking の中で呼ぶ
    pub fn new() -> Result<Self, ConversionError> {
        let dictionary = load_dictionary(DICTIONARY_URI)
            .map_err(|e| ConversionError::Initialization(e.to_string()))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self {
            tokenizer: Tokenizer::new(segmenter),
        })
    }
}

impl ReadingAnalyzer for MorphologicalAnalyzer {
    fn to_hiragana(&self, text: &str) -> Result<String, ConversionError> {
        let mut tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| ConversionError::Failed(e.to_string()))?;

        let mut result = String::with_capacity(text.len());
        for token in tokens.iter_mut() {
            let surface = token.surface.to_string();
            let details = token.details();
            // 未知語は読みがないので表層形のまま
            let reading = match details.get(READING_FIELD) {
                Some(r) if *r != "*" => r.to_string(),
                _ => surface,
            };
            result.extend(reading.chars().map(katakana_to_hiragana_char));
        }

        if contains_kanji(&result) {
            tracing::debug!(text, "some kanji had no reading in the dictionary");
        }
        Ok(result)
    }
}

// --------------------------------------------------
// 変換サービス
// --------------------------------------------------

type Loader = dyn Fn() -> Result<Arc<dyn ReadingAnalyzer>, ConversionError> + Send + Sync;

struct Inner {
    analyzer: OnceCell<Arc<dyn ReadingAnalyzer>>,
    loader: Arc<Loader>,
}

/// 解析器の初期化と変換をまとめたサービス
///
/// 初期化 (辞書の読み込み) は重いので `initialize` をバックグラウンドで呼ぶ。
/// 準備ができるまで、また失敗したときは `convert` は入力をそのまま返す。
#[derive(Clone)]
pub struct PhoneticConverter {
    inner: Arc<Inner>,
}

impl PhoneticConverter {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ReadingAnalyzer>, ConversionError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                analyzer: OnceCell::new(),
                loader: Arc::new(loader),
            }),
        }
    }

    /// 埋め込み辞書の形態素解析を使う
    pub fn from_builtin() -> Self {
        Self::new(|| {
            let analyzer = MorphologicalAnalyzer::new()?;
            tracing::debug!(dictionary = DICTIONARY_URI, "reading dictionary loaded");
            Ok(Arc::new(analyzer) as Arc<dyn ReadingAnalyzer>)
        })
    }

    /// 解析器を読み込む。何度呼んでも読み込みは1回だけ
    pub async fn initialize(&self) -> Result<(), ConversionError> {
        self.inner
            .analyzer
            .get_or_try_init(|| {
                let loader = Arc::clone(&self.inner.loader);
                async move {
                    match tokio::task::spawn_blocking(move || loader()).await {
                        Ok(result) => result,
                        Err(e) => Err(ConversionError::Initialization(e.to_string())),
                    }
                }
            })
            .await?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.inner.analyzer.initialized()
    }

    /// ひらがなに変換する。失敗したら元の文字列を返す
    pub async fn convert(&self, text: &str) -> String {
        let Some(analyzer) = self.inner.analyzer.get().cloned() else {
            tracing::debug!("reading analyzer not ready, skipping conversion");
            return text.to_string();
        };

        let input = text.to_string();
        let result = tokio::task::spawn_blocking(move || analyzer.to_hiragana(&input))
            .await
            .unwrap_or_else(|e| Err(ConversionError::Failed(e.to_string())));
        match result {
            Ok(converted) => {
                tracing::debug!(input = text, output = %converted, "converted to hiragana");
                converted
            }
            Err(e) => {
                tracing::warn!(error = %e, "kanji to hiragana conversion failed");
                text.to_string()
            }
        }
    }
}
