//! Category registry.
//!
//! Categories with `user_id = None` are shared by every user; users customize
//! them through [`category_overrides`](crate::category_overrides) instead of
//! editing the shared row.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, category_overrides::CategoryOverride, util::normalize_name_key};

/// Name of the system category carrying balance reconciliations.
pub const ADJUSTMENT_CATEGORY_NAME: &str = "Ajuste de Saldo";

/// Shared expense categories every installation starts with.
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Alimentação",
    "Transporte",
    "Moradia",
    "Lazer",
    "Saúde",
    "Educação",
    "Assinaturas",
    "Compras",
    "Pets",
    "Mercado",
    "Telecom",
    "Outros",
];

/// Shared income categories every installation starts with. The adjustment
/// category is created apart, flagged as system.
pub const DEFAULT_INCOME_CATEGORIES: &[&str] = &["Salário", "Freelance", "Investimentos", "Presente"];

/// Whether `name` collides with the reserved adjustment category name.
///
/// The comparison ignores case, surrounding/inner whitespace differences and
/// Unicode compatibility forms.
pub fn is_reserved_name(name: &str) -> bool {
    normalize_name_key(name) == normalize_name_key(ADJUSTMENT_CATEGORY_NAME)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for CategoryType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidName(format!(
                "invalid category type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    /// `None` for shared categories.
    pub user_id: Option<Uuid>,
    pub name: String,
    pub kind: CategoryType,
    pub is_system: bool,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub monthly_budget: Option<MoneyCents>,
}

impl Category {
    pub fn is_shared(&self) -> bool {
        self.user_id.is_none()
    }

    /// Returns a copy with the user's customization patched on top.
    ///
    /// Only the fields the override actually sets replace the shared values.
    #[must_use]
    pub fn with_override(&self, patch: &CategoryOverride) -> Self {
        let mut out = self.clone();
        if let Some(name) = &patch.name {
            out.name = name.clone();
        }
        if let Some(icon) = &patch.icon {
            out.icon = Some(icon.clone());
        }
        if let Some(color) = &patch.color {
            out.color = Some(color.clone());
        }
        if let Some(budget) = patch.monthly_budget {
            out.monthly_budget = Some(budget);
        }
        out
    }
}

/// A category as seen by one user for one month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub has_override: bool,
    /// Absolute operational spending in the requested month (expense
    /// categories only, zero otherwise).
    pub current_spending: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub is_system: bool,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub monthly_budget_minor: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_overrides::Entity")]
    Overrides,
}

impl Related<super::category_overrides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Overrides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            is_system: ActiveValue::Set(value.is_system),
            icon: ActiveValue::Set(value.icon.clone()),
            color: ActiveValue::Set(value.color.clone()),
            monthly_budget_minor: ActiveValue::Set(value.monthly_budget.map(MoneyCents::cents)),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: CategoryType::try_from(model.kind.as_str())?,
            is_system: model.is_system,
            icon: model.icon,
            color: model.color,
            monthly_budget: model.monthly_budget_minor.map(MoneyCents::new),
        })
    }
}
