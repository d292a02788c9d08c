//! 通報の下書きと送信前バリデーション。

use thiserror::Error;

use crate::{category::Category, notify::Toast};

/// 説明文の上限・下限（文字数）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormLimits {
    /// 説明文の最大文字数。
    pub description_max_chars: usize,
    /// 説明文（前後空白除去後）の最小文字数。
    pub description_min_chars: usize,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            description_max_chars: 500,
            description_min_chars: 10,
        }
    }
}

/// 入力不備の種類。最初に失敗した規則だけを返す。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("location is required")]
    MissingLocation,
    #[error("category is required")]
    MissingCategory,
    #[error("description must have at least {min} characters")]
    DescriptionTooShort { min: usize },
}

impl ValidationError {
    /// 利用者向けのトーストへ変換する。
    pub fn toast(&self) -> Toast {
        match self {
            ValidationError::MissingLocation => Toast::destructive(
                "Localização obrigatória",
                "Precisamos saber onde o problema está!",
            ),
            ValidationError::MissingCategory => Toast::destructive(
                "Categoria obrigatória",
                "Selecione o tipo de problema para prosseguir.",
            ),
            ValidationError::DescriptionTooShort { min } => Toast::destructive(
                "Descrição muito curta",
                format!("Descreva o problema com pelo menos {min} caracteres."),
            ),
        }
    }
}

/// 入力中の通報内容。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportDraft {
    /// 住所の手入力、またはGPSから得た "lat, lon"。
    pub location: String,
    /// 選択中のカテゴリ（未選択はNone）。
    pub category: Option<Category>,
    /// 問題の説明。
    pub description: String,
}

impl ReportDraft {
    pub fn set_location(&mut self, text: impl Into<String>) {
        self.location = text.into();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    /// 説明文を設定する。上限を超える分は毎回切り詰める。
    pub fn set_description(&mut self, text: &str, max_chars: usize) {
        self.description = text.chars().take(max_chars).collect();
    }

    /// 場所 → カテゴリ → 説明文の順に検証し、最初の不備で止める。
    pub fn validate(&self, limits: &FormLimits) -> Result<(), ValidationError> {
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingLocation);
        }
        if self.category.is_none() {
            return Err(ValidationError::MissingCategory);
        }
        if self.description.trim().chars().count() < limits.description_min_chars {
            return Err(ValidationError::DescriptionTooShort {
                min: limits.description_min_chars,
            });
        }
        Ok(())
    }

    /// 全項目を空に戻す。
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn description_chars(&self) -> usize {
        self.description.chars().count()
    }
}
