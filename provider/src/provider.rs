//! Provider registry: type names to resource and data-source handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::data_sources::{DataSource, DynamicGroupDataSource};
use crate::diag::{Diagnostic, Diagnostics};
use crate::resource_data::ResourceData;
use crate::resources::{DynamicGroupResource, Resource, UserDelegateResource};

pub struct Provider {
    client: ApiClient,
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl Provider {
    pub fn new(client: ApiClient) -> Self {
        let resources: [Arc<dyn Resource>; 2] = [
            Arc::new(DynamicGroupResource::new()),
            Arc::new(UserDelegateResource::new()),
        ];
        let data_sources: [Arc<dyn DataSource>; 1] = [Arc::new(DynamicGroupDataSource::new())];

        Self {
            client,
            resources: resources
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(type_name).cloned()
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSource>> {
        self.data_sources.get(type_name).cloned()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    fn lookup_resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, Diagnostics> {
        let resource = self
            .resource(type_name)
            .ok_or_else(|| Diagnostics::error(format!("Unknown resource type {type_name:?}")))?;
        self.check_scope(type_name, resource.oauth_scope())?;
        Ok(resource)
    }

    fn check_scope(&self, type_name: &str, scope: &str) -> Result<(), Diagnostics> {
        if self.client.has_scope(scope) {
            return Ok(());
        }
        Err(Diagnostics::from(
            Diagnostic::error("Missing OAuth scope").with_detail(format!(
                "{type_name} requires the {scope:?} scope; add it to oauth_scopes."
            )),
        ))
    }

    /// Validates the planned values, fills defaults and creates the object.
    pub async fn create(&self, type_name: &str, data: &mut ResourceData) -> Diagnostics {
        let resource = match self.lookup_resource(type_name) {
            Ok(resource) => resource,
            Err(diags) => return diags,
        };
        let schema = resource.schema();
        schema.apply_defaults(data);
        let diags = schema.validate(data);
        if diags.has_error() {
            return diags;
        }
        resource.create(&self.client, data).await
    }

    pub async fn read(&self, type_name: &str, data: &mut ResourceData) -> Diagnostics {
        match self.lookup_resource(type_name) {
            Ok(resource) => resource.read(&self.client, data).await,
            Err(diags) => diags,
        }
    }

    /// Applies in-place changes. Changes to force-new attributes are refused.
    pub async fn update(&self, type_name: &str, data: &mut ResourceData) -> Diagnostics {
        let resource = match self.lookup_resource(type_name) {
            Ok(resource) => resource,
            Err(diags) => return diags,
        };
        let schema = resource.schema();
        schema.apply_defaults(data);
        let mut diags = schema.validate(data);
        for name in schema.requires_replace(data) {
            diags.push(
                Diagnostic::error("Attribute change requires replacement")
                    .with_attribute(name)
                    .with_detail(format!(
                        "Changing {name:?} of {type_name} replaces the resource; delete and create it instead."
                    )),
            );
        }
        if diags.has_error() {
            return diags;
        }
        resource.update(&self.client, data).await
    }

    pub async fn delete(&self, type_name: &str, data: &mut ResourceData) -> Diagnostics {
        match self.lookup_resource(type_name) {
            Ok(resource) => resource.delete(&self.client, data).await,
            Err(diags) => diags,
        }
    }

    /// Builds state from an import id and refreshes it.
    pub async fn import(&self, type_name: &str, id: &str) -> Result<ResourceData, Diagnostics> {
        let resource = self.lookup_resource(type_name)?;
        let mut data = resource.import(id).map_err(Diagnostics::from_error)?;
        tracing::info!("Importing {type_name} {id:?}");
        let diags = resource.read(&self.client, &mut data).await;
        if diags.has_error() {
            return Err(diags);
        }
        if data.id().is_none() {
            return Err(Diagnostics::error(format!(
                "Cannot import non-existent remote object {type_name} {id:?}"
            )));
        }
        Ok(data)
    }

    pub async fn read_data_source(&self, type_name: &str, data: &mut ResourceData) -> Diagnostics {
        let Some(data_source) = self.data_source(type_name) else {
            return Diagnostics::error(format!("Unknown data source type {type_name:?}"));
        };
        if let Err(diags) = self.check_scope(type_name, data_source.oauth_scope()) {
            return diags;
        }
        let diags = data_source.schema().validate(data);
        if diags.has_error() {
            return diags;
        }
        data_source.read(&self.client, data).await
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("client", &self.client)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}
