//! Switch from per-language database tables to gettext catalogs.

use rusqlite::types::Value;

use crate::database::Database;
use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};

const LEGACY_PREFIX: &str = "lang_";

/// Legacy language table suffix to gettext locale.
const LANGUAGE_LOCALES: &[(&str, &str)] = &[
    ("Arabic", "ar_AE"),
    ("Azerbaijani", "az_AZ"),
    ("BasqueSpain", "eu_ES"),
    ("Bulgarian", "bg_BG"),
    ("Catalan", "ca_ES"),
    ("ChineseChina", "zh_CN"),
    ("ChineseHongKong", "zh_HK"),
    ("ChineseTaiwan", "zh_TW"),
    ("Czech", "cs_CZ"),
    ("Danish", "da_DK"),
    ("Dutch", "nl_NL"),
    ("EnglishBritain", "en_GB"),
    ("FarsiIran", "fa_IR"),
    ("Finnish", "fi_FI"),
    ("FrenchFrance", "fr_FR"),
    ("Galego", "gl_ES"),
    ("GermanGermany", "de_DE"),
    ("GreekGreece", "el_GR"),
    ("Hungarian", "hu_HU"),
    ("ItalianItaly", "it_IT"),
    ("Japanese", "ja_JP"),
    ("Lithuanian", "lt_LT"),
    ("NorwegianNorway", "nb_NO"),
    ("Polish", "pl_PL"),
    ("PortugueseBrazil", "pt_BR"),
    ("Portuguese", "pt_PT"),
    ("Romanian", "ro_RO"),
    ("Russian", "ru_RU"),
    ("Slovak", "sk_SK"),
    ("SpanishArgentina", "es_AR"),
    ("SpanishSpain", "es_ES"),
    ("Swedish", "sv_SE"),
    ("Thai", "th_TH"),
    ("Turkish", "tr_TR"),
    ("Ukrainian", "uk_UA"),
];

pub fn rev_67(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    if let Some(initial_lang) = ctx.get_config("USER_INITIAL_LANG")? {
        let renamed = initial_lang.replace(LEGACY_PREFIX, "");
        if renamed != initial_lang {
            ctx.set_config("USER_INITIAL_LANG", &renamed)?;
        }
    }

    let mut statements = Vec::new();

    for table in ctx.list_tables()? {
        if table.contains(LEGACY_PREFIX) {
            statements.push(Statement::sql(format!(
                "DROP TABLE {}",
                Database::quote_identifier(&table)?
            )));
        }
    }

    for (language, locale) in LANGUAGE_LOCALES {
        statements.push(Statement::bound(
            "UPDATE user_gui_props SET lang = ?1 WHERE lang = ?2",
            vec![
                Value::Text((*locale).to_owned()),
                Value::Text(format!("{}{}", LEGACY_PREFIX, language)),
            ],
        ));
    }

    Ok(statements)
}
