//! 通報フォームのコントローラ（下書き・添付・送信状態の管理）。

use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    attachments::{Attachment, StagingBuffer},
    category::Category,
    config::Config,
    draft::{FormLimits, ReportDraft, ValidationError},
    geo::{Coordinates, GeoError, GeoLocator},
    notify::Toast,
    submission::{ReportPayload, SubmissionReceipt, SubmitError, Submitter},
};

/// 送信状態。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
}

/// 非同期処理の完了通知。
#[derive(Debug)]
pub enum FormEvent {
    /// 現在地取得の結果。
    LocationResolved(Result<Coordinates, GeoError>),
    /// 送信（リトライ込み）の最終結果。
    SubmissionFinished(Result<SubmissionReceipt, SubmitError>),
}

/// 送信失敗時の再試行方針。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 試行回数の上限（1なら再試行なし）。
    pub max_attempts: u32,
    /// 線形バックオフの単位。
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// コントローラの固定パラメータ。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormSettings {
    pub limits: FormLimits,
    pub max_attachments: usize,
    pub retry: RetryPolicy,
}

impl FormSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            limits: cfg.limits(),
            max_attachments: cfg.form.max_attachments,
            retry: RetryPolicy {
                max_attempts: cfg.submission.max_attempts,
                backoff: cfg.submission.retry_backoff(),
            },
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            limits: FormLimits::default(),
            max_attachments: crate::attachments::DEFAULT_MAX_ATTACHMENTS,
            retry: RetryPolicy::default(),
        }
    }
}

/// 1つのフォームが専有する状態と操作。
pub struct FormController {
    draft: ReportDraft,
    attachments: StagingBuffer,
    settings: FormSettings,
    state: SubmissionState,
    /// 現在地取得中はtrue（場所入力を無効化する）。
    locating: bool,
    /// teardown後はfalse。遅延結果の適用可否に使う。
    alive: bool,
    locator: Option<Arc<dyn GeoLocator>>,
    submitter: Arc<dyn Submitter>,
    toasts: mpsc::UnboundedSender<Toast>,
    events_tx: mpsc::UnboundedSender<FormEvent>,
    events_rx: mpsc::UnboundedReceiver<FormEvent>,
    pending_location: Option<JoinHandle<()>>,
    pending_submit: Option<JoinHandle<()>>,
}

impl FormController {
    /// 空の下書きでフォームを作る。
    pub fn new(
        settings: FormSettings,
        locator: Option<Arc<dyn GeoLocator>>,
        submitter: Arc<dyn Submitter>,
        toasts: mpsc::UnboundedSender<Toast>,
    ) -> Self {
        // 添付の変更はバッファから同期的に通知される。
        let max = settings.max_attachments;
        let attachments = StagingBuffer::with_observer(max, move |items| {
            tracing::info!("attachments changed: {}/{}", items.len(), max);
        });
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            draft: ReportDraft::default(),
            attachments,
            settings,
            state: SubmissionState::Idle,
            locating: false,
            alive: true,
            locator,
            submitter,
            toasts,
            events_tx,
            events_rx,
            pending_location: None,
            pending_submit: None,
        }
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.items()
    }

    pub fn max_attachments(&self) -> usize {
        self.attachments.max_count()
    }

    pub fn attachments_full(&self) -> bool {
        self.attachments.is_full()
    }

    pub fn limits(&self) -> &FormLimits {
        &self.settings.limits
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    pub fn is_locating(&self) -> bool {
        self.locating
    }

    /// 場所を設定する。取得中は入力を受け付けずfalseを返す。
    pub fn set_location(&mut self, text: impl Into<String>) -> bool {
        if self.locating {
            tracing::debug!("location edit ignored while locating");
            return false;
        }
        self.draft.set_location(text);
        true
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.draft.set_category(category);
    }

    /// 説明文を設定する（上限で切り詰め）。
    pub fn set_description(&mut self, text: &str) {
        self.draft
            .set_description(text, self.settings.limits.description_max_chars);
    }

    /// 選択・ドロップされた添付をまとめて追加する。
    pub fn add_attachments(&mut self, batch: Vec<Attachment>) -> &[Attachment] {
        self.attachments.add_batch(batch)
    }

    pub fn remove_attachment(&mut self, index: usize) -> &[Attachment] {
        self.attachments.remove_at(index)
    }

    /// 現在地の取得を開始する。結果はイベントとして後で適用する。
    pub fn capture_location(&mut self) {
        if self.locating || !self.alive {
            return;
        }
        let Some(locator) = self.locator.clone() else {
            tracing::warn!("geolocation unavailable");
            self.toast(GeoError::Unavailable.toast());
            return;
        };

        tracing::info!("location capture started");
        self.locating = true;
        let tx = self.events_tx.clone();
        self.pending_location = Some(tokio::spawn(async move {
            let result = locator.current_position().await;
            let _ = tx.send(FormEvent::LocationResolved(result));
        }));
    }

    /// 検証して送信を開始する。送信中の再実行は無視する。
    pub fn submit(&mut self) -> Result<(), ValidationError> {
        if self.is_submitting() || !self.alive {
            tracing::warn!("submit ignored (state={:?}, alive={})", self.state, self.alive);
            return Ok(());
        }
        if let Err(e) = self.draft.validate(&self.settings.limits) {
            tracing::warn!("validation failed: {e}");
            self.toast(e.toast());
            return Err(e);
        }
        // 検証済みなのでカテゴリは必ずある。
        let Some(category) = self.draft.category else {
            return Err(ValidationError::MissingCategory);
        };

        let payload = ReportPayload {
            location: self.draft.location.trim().to_string(),
            category,
            description: self.draft.description.trim().to_string(),
            attachments: self.attachments.items().to_vec(),
        };
        self.state = SubmissionState::Submitting;
        tracing::info!("submission started ({})", category.value());

        let submitter = Arc::clone(&self.submitter);
        let retry = self.settings.retry;
        let tx = self.events_tx.clone();
        self.pending_submit = Some(tokio::spawn(async move {
            let result = submit_with_retry(submitter.as_ref(), &payload, retry).await;
            let _ = tx.send(FormEvent::SubmissionFinished(result));
        }));
        Ok(())
    }

    /// 届いているイベントをすべて適用し、件数を返す。
    pub fn poll_events(&mut self) -> usize {
        let mut n = 0;
        while let Ok(ev) = self.events_rx.try_recv() {
            self.handle_event(ev);
            n += 1;
        }
        n
    }

    /// イベントを状態へ反映する。teardown後は捨てる。
    fn handle_event(&mut self, ev: FormEvent) {
        if !self.alive {
            tracing::debug!("event discarded after teardown: {ev:?}");
            return;
        }
        match ev {
            FormEvent::LocationResolved(result) => {
                self.locating = false;
                self.pending_location = None;
                match result {
                    Ok(coords) => {
                        tracing::info!("location captured: {coords}");
                        self.draft.set_location(coords.to_string());
                        self.toast(Toast::info(
                            "Localização obtida!",
                            "Sua localização foi detectada automaticamente.",
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("location capture failed: {e}");
                        self.toast(e.toast());
                    }
                }
            }
            FormEvent::SubmissionFinished(result) => {
                self.state = SubmissionState::Idle;
                self.pending_submit = None;
                match result {
                    Ok(receipt) => {
                        tracing::info!(
                            "submission done: {} at {} ({} bytes)",
                            receipt.id,
                            receipt.submitted_at.format("%Y-%m-%d %H:%M:%S"),
                            receipt.payload_bytes
                        );
                        self.toast(Toast::info(
                            "Problema reportado com sucesso!",
                            "Sua solicitação foi enviada. Você receberá atualizações em breve.",
                        ));
                        self.draft.clear();
                        self.attachments.reset();
                    }
                    Err(e) => {
                        // 下書きは残し、再送信できるようにする。
                        tracing::error!("submission failed: {e}");
                        self.toast(e.toast());
                    }
                }
            }
        }
    }

    /// 保留中の処理を止め、以降の遅延結果を無効にする。
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        if let Some(h) = self.pending_location.take() {
            h.abort();
        }
        if let Some(h) = self.pending_submit.take() {
            h.abort();
        }
        tracing::info!("form torn down");
    }

    fn toast(&self, t: Toast) {
        tracing::info!("toast: {t}");
        let _ = self.toasts.send(t);
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// 上限回数まで送信を試みる。待ち時間は試行回数に比例させる。
async fn submit_with_retry(
    submitter: &dyn Submitter,
    payload: &ReportPayload,
    retry: RetryPolicy,
) -> Result<SubmissionReceipt, SubmitError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match submitter.submit(payload).await {
            Ok(receipt) => return Ok(receipt),
            Err(e) if attempt < max_attempts => {
                tracing::warn!("submit attempt {attempt}/{max_attempts} failed: {e}");
                tokio::time::sleep(retry.backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
