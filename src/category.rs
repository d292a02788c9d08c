//! 問題カテゴリの列挙と表示ラベル。

use serde::{Deserialize, Serialize};

/// 受け付ける問題カテゴリ（固定の7種）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 街灯・公共照明。
    Iluminacao,
    /// 道路の穴。
    Buraco,
    /// 清掃・ゴミ収集。
    Limpeza,
    /// 上下水道。
    Agua,
    /// 標識・信号。
    Sinalizacao,
    /// 樹木の剪定。
    Arvore,
    /// その他。
    Outros,
}

impl Category {
    /// 選択肢の表示順。
    pub const ALL: [Category; 7] = [
        Category::Iluminacao,
        Category::Buraco,
        Category::Limpeza,
        Category::Agua,
        Category::Sinalizacao,
        Category::Arvore,
        Category::Outros,
    ];

    /// フォーム値としての識別子。
    pub fn value(self) -> &'static str {
        match self {
            Category::Iluminacao => "iluminacao",
            Category::Buraco => "buraco",
            Category::Limpeza => "limpeza",
            Category::Agua => "agua",
            Category::Sinalizacao => "sinalizacao",
            Category::Arvore => "arvore",
            Category::Outros => "outros",
        }
    }

    /// 画面に出すラベル。
    pub fn label(self) -> &'static str {
        match self {
            Category::Iluminacao => "Iluminação Pública",
            Category::Buraco => "Buraco na Via",
            Category::Limpeza => "Limpeza e Coleta",
            Category::Agua => "Água e Esgoto",
            Category::Sinalizacao => "Sinalização",
            Category::Arvore => "Poda de Árvores",
            Category::Outros => "Outros",
        }
    }

    /// 識別子からカテゴリを引く。未知の値や空文字はNone。
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.value() == value)
    }

    /// 一覧内の位置（選択ボックスの初期位置に使う）。
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }
}
