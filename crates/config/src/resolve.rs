use std::collections::BTreeMap;

use providers::{ConfigProvider, FieldHint, ProviderValue, Registry};

use crate::errors::ConfigError;
use crate::model::{deserialize_value, Configuration, FieldKind, FieldSpec};
use crate::section::SectionContext;
use crate::trace::LookupTrace;

/// Resolves `config` in place against `registry`, returning `Ok(())` once every required field
/// (including nested sub-configurations) has a value, or the error that made resolution
/// impossible.
///
/// `explicit_sections` take precedence over the ambient sections carried by `ctx`; pass an empty
/// slice to resolve purely from `ctx`. `explicit_value` seeds the top-level native
/// representation (e.g. a connection string passed by the caller) and is otherwise obtained by
/// probing providers for the configuration's own section name.
#[tracing::instrument(skip(config, registry, ctx, explicit_value), fields(type_name = config.type_name()))]
pub fn resolve_configuration(
    config: &mut dyn Configuration,
    registry: &Registry,
    ctx: &SectionContext,
    explicit_sections: &[&str],
    mut explicit_value: Option<ProviderValue>,
    accept_partial: bool,
) -> Result<(), ConfigError> {
    if let Some(section) = config.section().map(str::to_string) {
        if explicit_value.is_none() {
            let hint = if config.is_credentials() {
                FieldHint::Secret
            } else {
                FieldHint::Scalar
            };
            let (value, traces) = resolve_single_value(
                registry,
                ctx,
                &section,
                hint,
                None,
                explicit_sections,
                Vec::new(),
            )
            .map_err(|e| e.into_config_error(config.type_name(), "__section__"))?;
            log_traces(config.type_name(), &section, &traces);
            explicit_value = match value {
                Some(v) if v.as_mapping().is_some() => None,
                other => other,
            };
        }
    }
    resolve_configuration_inner(config, registry, ctx, explicit_sections, &[], explicit_value, accept_partial)
}

fn resolve_configuration_inner(
    config: &mut dyn Configuration,
    registry: &Registry,
    ctx: &SectionContext,
    explicit_sections: &[&str],
    embedded_sections: &[String],
    explicit_value: Option<ProviderValue>,
    accept_partial: bool,
) -> Result<(), ConfigError> {
    if config.is_resolved() {
        return Ok(());
    }
    config.set_exception(None);

    let field_explicit_values: Option<serde_json::Map<String, serde_json::Value>> =
        match explicit_value {
            Some(v) if v.as_mapping().is_some() => match v.into_json() {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            },
            Some(v) => {
                config.parse_native_representation(&v)?;
                None
            }
            None => None,
        };

    let fields_result = if !config.is_resolved() {
        resolve_config_fields(
            config,
            field_explicit_values.as_ref(),
            registry,
            ctx,
            explicit_sections,
            embedded_sections,
            accept_partial,
        )
    } else {
        Ok(())
    };

    match fields_result {
        Ok(()) => {
            run_on_resolved(config);
            config.set_resolved(true);
            Ok(())
        }
        Err(err @ ConfigError::FieldMissing { .. }) => {
            config.set_exception(Some(err.clone()));
            config.on_partial();
            for hook in config.composed_hooks() {
                hook.on_partial();
            }
            if config.is_resolved() {
                run_on_resolved(config);
                Ok(())
            } else if accept_partial {
                Ok(())
            } else {
                Err(err)
            }
        }
        Err(other) => {
            config.set_exception(Some(other.clone()));
            Err(other)
        }
    }
}

fn run_on_resolved(config: &mut dyn Configuration) {
    config.on_resolved();
    for hook in config.composed_hooks() {
        hook.on_resolved();
    }
}

fn resolve_config_fields(
    config: &mut dyn Configuration,
    explicit_values: Option<&serde_json::Map<String, serde_json::Value>>,
    registry: &Registry,
    ctx: &SectionContext,
    explicit_sections: &[&str],
    embedded_sections: &[String],
    accept_partial: bool,
) -> Result<(), ConfigError> {
    let type_name = config.type_name();
    let config_section = config.section().map(str::to_string);
    let fields: &'static [FieldSpec] = config.fields();
    let mut unresolved: BTreeMap<String, Vec<LookupTrace>> = BTreeMap::new();

    for field in fields {
        let default_value = config.get_field(field.key);

        let explicit_field_value: Option<serde_json::Value> =
            explicit_values.and_then(|map| map.get(field.key).cloned());

        match field.kind {
            FieldKind::UnionOfSubConfigurations(alternatives) => {
                resolve_union_field(
                    config,
                    field,
                    alternatives,
                    registry,
                    ctx,
                    explicit_sections,
                    embedded_sections,
                    accept_partial,
                    &mut unresolved,
                )?;
            }
            FieldKind::SubConfiguration(factory) => {
                resolve_sub_config_field(
                    config,
                    field,
                    factory,
                    registry,
                    ctx,
                    explicit_sections,
                    embedded_sections,
                    explicit_field_value,
                    accept_partial,
                    &mut unresolved,
                )?;
            }
            FieldKind::Context => {
                let value = registry.context_provider().get_value(field.key);
                match value {
                    Some(v) => {
                        let json = deserialize_value(field.key, v, field.kind)?;
                        set_if_changed(config, type_name, field, &default_value, Some(json))?;
                    }
                    None => {
                        if !field.optional {
                            unresolved.insert(field.key.to_string(), Vec::new());
                        }
                    }
                }
            }
            FieldKind::Scalar | FieldKind::Secret => {
                let (value, traces) = if let Some(v) = explicit_field_value {
                    (Some(v), Vec::new())
                } else {
                    let (raw, traces) = resolve_single_value(
                        registry,
                        ctx,
                        field.key,
                        field.kind.provider_hint(),
                        config_section.clone(),
                        explicit_sections,
                        embedded_sections.to_vec(),
                    )
                    .map_err(|e| e.into_config_error(type_name, field.key))?;
                    log_traces(type_name, field.key, &traces);
                    let value = match raw {
                        Some(v) => Some(deserialize_value(field.key, v, field.kind)?),
                        None => None,
                    };
                    (value, traces)
                };

                let current = value.or_else(|| default_value.clone());
                if !field.optional && current.is_none() {
                    unresolved.insert(field.key.to_string(), traces);
                }
                set_if_changed(config, type_name, field, &default_value, current)?;
            }
        }
    }

    if !unresolved.is_empty() {
        return Err(ConfigError::FieldMissing {
            type_name,
            missing: unresolved,
        });
    }
    Ok(())
}

fn set_if_changed(
    config: &mut dyn Configuration,
    type_name: &'static str,
    field: &FieldSpec,
    default_value: &Option<serde_json::Value>,
    current: Option<serde_json::Value>,
) -> Result<(), ConfigError> {
    if &current != default_value {
        if field.is_final {
            return Err(ConfigError::FinalFieldConflict {
                type_name,
                field: field.key,
            });
        }
        if let Some(v) = current {
            config.set_field(field.key, v)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn resolve_sub_config_field(
    config: &mut dyn Configuration,
    field: &FieldSpec,
    factory: fn() -> Box<dyn Configuration>,
    registry: &Registry,
    ctx: &SectionContext,
    explicit_sections: &[&str],
    embedded_sections: &[String],
    explicit_field_value: Option<serde_json::Value>,
    accept_partial: bool,
    unresolved: &mut BTreeMap<String, Vec<LookupTrace>>,
) -> Result<(), ConfigError> {
    let mut embedded_config = factory();
    let mut traces = Vec::new();

    let mut initial_value: Option<ProviderValue> = explicit_field_value.map(ProviderValue::Json);

    if let Some(own_section) = embedded_config.section().map(str::to_string) {
        if initial_value.is_none() {
            let mut parent_chain = embedded_sections.to_vec();
            parent_chain.push(field.key.to_string());
            let (initial_key, initial_embedded) =
                apply_embedded_sections_to_config_sections(Some(own_section), parent_chain);
            let initial_key = initial_key.unwrap_or_else(|| field.key.to_string());
            let hint = if embedded_config.is_credentials() {
                FieldHint::Secret
            } else {
                FieldHint::Scalar
            };
            let (value, initial_traces) = resolve_single_value(
                registry,
                ctx,
                &initial_key,
                hint,
                None,
                explicit_sections,
                initial_embedded,
            )
            .map_err(|e| e.into_config_error(config.type_name(), field.key))?;
            log_traces(config.type_name(), &initial_key, &initial_traces);
            match value {
                Some(v) if v.as_mapping().is_some() => {}
                Some(v) => {
                    traces.extend(initial_traces);
                    initial_value = Some(v);
                }
                None => {}
            }
        }
    }

    let child_accept_partial = accept_partial || field.optional;
    let mut child_embedded = embedded_sections.to_vec();
    child_embedded.push(field.key.to_string());

    let result = resolve_configuration_inner(
        embedded_config.as_mut(),
        registry,
        ctx,
        explicit_sections,
        &child_embedded,
        initial_value,
        child_accept_partial,
    );

    match result {
        Ok(()) => {
            config.set_child(field.key, embedded_config)?;
            Ok(())
        }
        Err(ConfigError::FieldMissing { missing, .. }) if field.optional || child_accept_partial => {
            for (_, v) in missing {
                traces.extend(v);
            }
            if !field.optional {
                unresolved.insert(field.key.to_string(), traces);
            }
            config.set_child(field.key, embedded_config)?;
            Ok(())
        }
        Err(ConfigError::FieldMissing { missing, .. }) => {
            let mut all_traces = traces;
            for (_, v) in missing {
                all_traces.extend(v);
            }
            unresolved.insert(field.key.to_string(), all_traces);
            Ok(())
        }
        Err(other) => Err(other),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_union_field(
    config: &mut dyn Configuration,
    field: &FieldSpec,
    alternatives: &'static [fn() -> Box<dyn Configuration>],
    registry: &Registry,
    ctx: &SectionContext,
    explicit_sections: &[&str],
    embedded_sections: &[String],
    accept_partial: bool,
    unresolved: &mut BTreeMap<String, Vec<LookupTrace>>,
) -> Result<(), ConfigError> {
    let mut traces = Vec::new();
    let mut resolved_child = None;
    let mut last_invalid: Option<ConfigError> = None;

    for (idx, factory) in alternatives.iter().enumerate() {
        let mut candidate = factory();
        let mut child_embedded = embedded_sections.to_vec();
        child_embedded.push(field.key.to_string());

        match resolve_configuration_inner(
            candidate.as_mut(),
            registry,
            ctx,
            explicit_sections,
            &child_embedded,
            None,
            accept_partial,
        ) {
            Ok(()) => {
                resolved_child = Some(candidate);
                break;
            }
            Err(ConfigError::FieldMissing { missing, .. }) => {
                for (_, v) in missing {
                    traces.extend(v);
                }
            }
            Err(err @ ConfigError::InvalidNativeValue { .. }) => {
                if idx == alternatives.len() - 1 {
                    last_invalid = Some(err);
                }
            }
            Err(other) => return Err(other),
        }
    }

    match resolved_child {
        Some(child) => {
            config.set_child(field.key, child)?;
        }
        None => {
            if let Some(err) = last_invalid {
                return Err(err);
            }
            if !field.optional {
                unresolved.insert(field.key.to_string(), traces);
            }
        }
    }
    Ok(())
}

/// Result of a single-value probe that may fail with a secret-safety violation; kept distinct
/// from [`ConfigError`] because the low-level provider walk does not know the enclosing
/// configuration's type name or field key needed to build a full [`ConfigError::ValueNotSecret`].
struct NotSecretProbe {
    provider: String,
    effective_key: String,
}

impl NotSecretProbe {
    fn into_config_error(self, type_name: &'static str, field: &'static str) -> ConfigError {
        ConfigError::ValueNotSecret {
            type_name,
            field,
            provider: self.provider,
            effective_key: self.effective_key,
        }
    }
}

fn resolve_single_value(
    registry: &Registry,
    ctx: &SectionContext,
    key: &str,
    hint: FieldHint,
    config_section: Option<String>,
    explicit_sections: &[&str],
    embedded_sections: Vec<String>,
) -> Result<(Option<ProviderValue>, Vec<LookupTrace>), NotSecretProbe> {
    if matches!(hint, FieldHint::Context) {
        let value = registry.context_provider().get_value(key);
        return Ok((value, Vec::new()));
    }

    let (config_section, embedded_sections) =
        apply_embedded_sections_to_config_sections(config_section, embedded_sections);

    let explicit: Vec<String> = if !explicit_sections.is_empty() {
        explicit_sections.iter().map(|s| s.to_string()).collect()
    } else {
        ctx.sections.clone()
    };

    let mut traces = Vec::new();
    let mut look = |pipeline_name: Option<&str>,
                    traces: &mut Vec<LookupTrace>|
     -> Result<Option<ProviderValue>, NotSecretProbe> {
        for provider in registry.providers() {
            let (value, provider_traces) = resolve_single_provider_value(
                provider.as_ref(),
                key,
                hint,
                pipeline_name,
                config_section.as_deref(),
                &explicit,
                &embedded_sections,
            )?;
            traces.extend(provider_traces);
            if value.is_some() {
                return Ok(value);
            }
        }
        Ok(None)
    };

    let mut value = None;
    if let Some(pipeline_name) = ctx.pipeline_name.clone() {
        value = look(Some(&pipeline_name), &mut traces)?;
    }
    if value.is_none() {
        value = look(None, &mut traces)?;
    }
    Ok((value, traces))
}

#[allow(clippy::too_many_arguments)]
fn resolve_single_provider_value(
    provider: &dyn ConfigProvider,
    key: &str,
    hint: FieldHint,
    pipeline_name: Option<&str>,
    config_section: Option<&str>,
    explicit_sections: &[String],
    embedded_sections: &[String],
) -> Result<(Option<ProviderValue>, Vec<LookupTrace>), NotSecretProbe> {
    let mut traces = Vec::new();

    let mut sections: Vec<String> = if provider.supports_sections() {
        let mut v = explicit_sections.to_vec();
        v.extend(embedded_sections.iter().cloned());
        v
    } else if pipeline_name.is_some() {
        return Ok((None, traces));
    } else {
        Vec::new()
    };

    let mut value = None;
    loop {
        let full_ns: Vec<String> =
            if (pipeline_name.is_some() || config_section.is_some()) && provider.supports_sections()
            {
                let mut full = sections.clone();
                if let Some(p) = pipeline_name {
                    full.insert(0, p.to_string());
                }
                if let Some(c) = config_section {
                    full.push(c.to_string());
                }
                full
            } else {
                sections.clone()
            };
        let refs: Vec<&str> = full_ns.iter().map(String::as_str).collect();
        let (got, effective_key) = provider.get_value(key, hint, &refs);

        let cant_hold_it = !provider.supports_secrets() && hint.is_secret();
        if got.is_some() && cant_hold_it {
            return Err(NotSecretProbe {
                provider: provider.name().to_string(),
                effective_key,
            });
        }
        if !cant_hold_it {
            traces.push(LookupTrace::new(provider.name(), full_ns, effective_key, got.clone()));
        }
        if got.is_some() {
            value = got;
            break;
        }
        if sections.is_empty() {
            break;
        }
        sections.pop();
    }

    Ok((value, traces))
}

/// Replaces `config_section` with the innermost non-hidden embedded section (a section whose
/// name starts with `_` is hidden and never surfaces in a lookup path), then drops that entry
/// from the embedded chain and filters any remaining hidden entries out of it.
fn apply_embedded_sections_to_config_sections(
    mut config_section: Option<String>,
    mut embedded_sections: Vec<String>,
) -> (Option<String>, Vec<String>) {
    if let Some(last) = embedded_sections.last().cloned() {
        if !last.starts_with('_') {
            config_section = Some(last);
        }
        embedded_sections.pop();
    }
    let filtered = embedded_sections
        .into_iter()
        .filter(|s| !s.starts_with('_'))
        .collect();
    (config_section, filtered)
}

fn log_traces(type_name: &str, key: &str, traces: &[LookupTrace]) {
    for trace in traces {
        tracing::debug!(
            type_name,
            key,
            provider = %trace.provider_name,
            sections = ?trace.sections_tried,
            effective_key = %trace.effective_key,
            hit = trace.hit(),
            "lookup trace"
        );
    }
}
