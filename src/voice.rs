// ============================================
// src/voice.rs
// 音声入力 (音声認識 → ひらがな変換) のアダプタ
// ============================================

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::error::RecognitionError;
use crate::phonetic::PhoneticConverter;

/// 認識する言語
pub const LOCALE: &str = "ja-JP";

/// 認識の途中で止めるための合図 (送信側が drop されても止まる)
pub type StopSignal = oneshot::Receiver<()>;

/// 音声認識の機能 (1回の呼び出しで1発話だけ認識する)
#[async_trait]
pub trait SpeechCapability: Send + Sync {
    async fn recognize(&self, locale: &str, stop: StopSignal) -> Result<String, RecognitionError>;
}

/// 画面側に知らせる変化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceUpdate {
    /// 認識結果。`converted` はひらがな変換後の差し替え
    Transcript { text: String, converted: bool },
    Error(RecognitionError),
    /// 結果なしで終わった (利用者が止めた)
    Stopped,
}

#[derive(Debug)]
enum EventKind {
    Raw(String),
    Converted(String),
    Failed(RecognitionError),
}

#[derive(Debug)]
struct VoiceEvent {
    /// どの録音の結果か
    generation: u64,
    kind: EventKind,
}

/// 音声入力の状態を管理する
pub struct VoiceCapture {
    capability: Option<Arc<dyn SpeechCapability>>,
    converter: Option<PhoneticConverter>,
    runtime: Handle,
    locale: String,

    enabled: bool,
    listening: bool,
    transcript: String,
    error: Option<RecognitionError>,

    /// 録音ごとに増える番号。古い番号の結果は捨てる
    generation: u64,
    stop_tx: Option<oneshot::Sender<()>>,
    events_tx: mpsc::UnboundedSender<VoiceEvent>,
    events_rx: mpsc::UnboundedReceiver<VoiceEvent>,
}

impl VoiceCapture {
    /// `capability` が None なら音声入力は使えない
    pub fn new(
        capability: Option<Arc<dyn SpeechCapability>>,
        converter: Option<PhoneticConverter>,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            capability,
            converter,
            runtime,
            locale: LOCALE.to_string(),
            enabled: true,
            listening: false,
            transcript: String::new(),
            error: None,
            generation: 0,
            stop_tx: None,
            events_tx,
            events_rx,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capability.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&RecognitionError> {
        self.error.as_ref()
    }

    /// 録音を始める。始めなかったときは false
    pub fn start(&mut self) -> bool {
        if !self.enabled || self.listening {
            return false;
        }
        let Some(capability) = self.capability.clone() else {
            return false;
        };

        self.generation += 1;
        self.transcript.clear();
        self.error = None;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        self.listening = true;

        let generation = self.generation;
        let tx = self.events_tx.clone();
        let converter = self.converter.clone();
        let conversion_ready = converter.as_ref().is_some_and(|c| c.is_ready());
        let locale = self.locale.clone();

        self.runtime.spawn(async move {
            let send = |kind: EventKind| {
                // 受け手がいなければ捨てるだけ
                let _ = tx.send(VoiceEvent { generation, kind });
            };

            let text = match capability.recognize(&locale, stop_rx).await {
                Ok(text) if text.trim().is_empty() => {
                    send(EventKind::Failed(RecognitionError::NoSpeech));
                    return;
                }
                Ok(text) => text,
                Err(e) => {
                    send(EventKind::Failed(e));
                    return;
                }
            };

            // まずそのままの結果を出し、変換できたら差し替える
            send(EventKind::Raw(text.clone()));
            if let Some(converter) = converter {
                let converted = converter.convert(&text).await;
                if converted != text {
                    send(EventKind::Converted(converted));
                }
            }
        });

        tracing::info!(generation, conversion_ready, "voice capture started");
        true
    }

    /// 録音を途中で止める。録音中でなければ何もしない
    pub fn stop(&mut self) -> bool {
        if !self.listening {
            return false;
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.listening = false;
        tracing::debug!(generation = self.generation, "voice capture stopped");
        true
    }

    /// 録音を止め、まだ届いていない結果もすべて無効にする
    pub fn reset(&mut self) {
        self.stop();
        self.generation += 1;
        self.transcript.clear();
        self.error = None;
    }

    /// 無効にされたら録音も止める
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.reset();
        }
    }

    /// 届いている結果をすべて取り込む (UIのループから毎回呼ぶ)
    pub fn poll(&mut self) -> Vec<VoiceUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(update) = self.apply(event) {
                updates.push(update);
            }
        }
        updates
    }

    /// 次の変化を待つ
    #[cfg(test)]
    pub async fn next_update(&mut self) -> Option<VoiceUpdate> {
        loop {
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.apply(event) {
                return Some(update);
            }
        }
    }

    fn apply(&mut self, event: VoiceEvent) -> Option<VoiceUpdate> {
        if event.generation != self.generation {
            tracing::debug!(
                stale = event.generation,
                current = self.generation,
                "discarding stale voice result"
            );
            return None;
        }

        match event.kind {
            EventKind::Raw(text) => {
                self.finish_capture();
                self.transcript = text.clone();
                Some(VoiceUpdate::Transcript {
                    text,
                    converted: false,
                })
            }
            EventKind::Converted(text) => {
                if self.transcript == text {
                    return None;
                }
                self.transcript = text.clone();
                Some(VoiceUpdate::Transcript {
                    text,
                    converted: true,
                })
            }
            EventKind::Failed(e) => {
                self.finish_capture();
                if e.is_reportable() {
                    tracing::warn!(error = ?e, "speech recognition failed");
                    self.error = Some(e.clone());
                    Some(VoiceUpdate::Error(e))
                } else {
                    Some(VoiceUpdate::Stopped)
                }
            }
        }
    }

    fn finish_capture(&mut self) {
        self.listening = false;
        self.stop_tx = None;
    }
}
