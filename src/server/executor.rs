//! Execution layer: runs a resolved descriptor against a repository

use crate::core::error::{CrudError, RequestError, StorageError};
use crate::core::metadata::{FactoryOption, Key};
use crate::core::options::ResponseShape;
use crate::core::query::{PaginatedResponse, PaginationMeta};
use crate::core::repository::{CrudRepository, FindManyOptions, FindOptions};
use crate::core::request::{
    CreateBody, CrudCreateRequest, CrudDeleteRequest, CrudReadManyRequest, CrudReadOneRequest,
    CrudRecoverRequest, CrudRequest, CrudSearchRequest, CrudUpdateRequest, CrudUpsertRequest,
    RequestContext,
};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Status and JSON payload of an executed request
#[derive(Debug, Clone, PartialEq)]
pub struct CrudResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl CrudResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn created(body: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

impl IntoResponse for CrudResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Consumes the descriptor attached by an interceptor and calls the
/// repository
pub struct CrudExecutor {
    resource: String,
    factory: Arc<FactoryOption>,
    repository: Arc<dyn CrudRepository>,
}

impl CrudExecutor {
    pub fn new(
        resource: impl Into<String>,
        factory: Arc<FactoryOption>,
        repository: Arc<dyn CrudRepository>,
    ) -> Self {
        Self {
            resource: resource.into(),
            factory,
            repository,
        }
    }

    /// Execute the descriptor attached to `ctx`
    ///
    /// The descriptor is taken out of the context, so a second call fails.
    pub async fn execute(&self, ctx: &mut RequestContext) -> Result<CrudResponse, CrudError> {
        let request = ctx
            .take_crud_request()
            .ok_or_else(|| CrudError::Internal("no crud request attached".to_string()))?;

        tracing::debug!(resource = %self.resource, method = %request.method(), "executing crud request");

        match request {
            CrudRequest::Create(request) => self.create(request).await,
            CrudRequest::ReadOne(request) => self.read_one(request).await,
            CrudRequest::ReadMany(request) => self.read_many(request).await,
            CrudRequest::Search(request) => self.search(request).await,
            CrudRequest::Update(request) => self.update(request).await,
            CrudRequest::Upsert(request) => self.upsert(request).await,
            CrudRequest::Delete(request) => self.delete(request).await,
            CrudRequest::Recover(request) => self.recover(request).await,
        }
    }

    async fn create(&self, request: CrudCreateRequest) -> Result<CrudResponse, CrudError> {
        let shape = request.options.response;
        match request.body {
            CreateBody::One(entity) => {
                let row = self.save(None, entity.into_inner()).await?;
                Ok(CrudResponse::created(self.shape(row, shape)))
            }
            CreateBody::Many(entities) => {
                let mut rows = Vec::with_capacity(entities.len());
                for entity in entities {
                    let row = self.save(None, entity.into_inner()).await?;
                    rows.push(self.shape(row, shape));
                }
                Ok(CrudResponse::created(Value::Array(rows)))
            }
        }
    }

    async fn read_one(&self, request: CrudReadOneRequest) -> Result<CrudResponse, CrudError> {
        let options = FindOptions {
            fields: request.fields,
            with_deleted: request.soft_deleted,
            relations: request.relations,
        };
        let row = self.require(&request.params, &options).await?;
        Ok(CrudResponse::ok(self.shape(row, request.options.response)))
    }

    async fn read_many(&self, request: CrudReadManyRequest) -> Result<CrudResponse, CrudError> {
        let CrudReadManyRequest {
            filters,
            sort,
            pagination,
            fields,
            soft_deleted,
            relations,
            options,
        } = request;

        let conditions = if filters.is_empty() {
            Vec::new()
        } else {
            vec![filters]
        };
        let result = self
            .repository
            .find(&FindManyOptions {
                conditions,
                order: sort,
                take: pagination.limit,
                skip: pagination.offset(),
                find: FindOptions {
                    fields,
                    with_deleted: soft_deleted,
                    relations,
                },
            })
            .await
            .map_err(|e| StorageError::operation("find", e))?;

        let page = PaginatedResponse {
            data: self.shape_all(result.data, options.response),
            pagination: PaginationMeta::new(pagination.page, pagination.limit, result.total),
        };
        Ok(CrudResponse::ok(to_json(&page)?))
    }

    async fn search(&self, request: CrudSearchRequest) -> Result<CrudResponse, CrudError> {
        let CrudSearchRequest {
            select,
            where_,
            order,
            take,
            skip,
            soft_deleted,
            relations,
            options,
        } = request;

        let result = self
            .repository
            .find(&FindManyOptions {
                conditions: where_,
                order,
                take,
                skip,
                find: FindOptions {
                    fields: select,
                    with_deleted: soft_deleted,
                    relations,
                },
            })
            .await
            .map_err(|e| StorageError::operation("find", e))?;

        let page = PaginatedResponse {
            data: self.shape_all(result.data, options.response),
            pagination: PaginationMeta::from_offset(skip, take, result.total),
        };
        Ok(CrudResponse::ok(to_json(&page)?))
    }

    async fn update(&self, request: CrudUpdateRequest) -> Result<CrudResponse, CrudError> {
        let existing = self.require(&request.params, &bare(false)).await?;

        let mut merged = into_object(existing);
        merged.extend(request.body.into_inner());
        let row = self.save(Some(&request.params), merged).await?;
        Ok(CrudResponse::ok(self.shape(row, request.options.response)))
    }

    async fn upsert(&self, request: CrudUpsertRequest) -> Result<CrudResponse, CrudError> {
        let key = &request.params;
        let existing = self.find_one(key, &bare(true)).await?;

        if existing.is_some() && self.find_one(key, &bare(false)).await?.is_none() {
            return Err(CrudError::conflict(format!(
                "{} with key '{}' is soft deleted",
                self.resource, key
            )));
        }

        let mut entity = request.body.into_inner();
        entity.extend(key.to_json());
        let row = self.save(Some(key), entity).await?;
        let shaped = self.shape(row, request.options.response);

        Ok(match existing {
            Some(_) => CrudResponse::ok(shaped),
            None => CrudResponse::created(shaped),
        })
    }

    async fn delete(&self, request: CrudDeleteRequest) -> Result<CrudResponse, CrudError> {
        let key = &request.params;
        // a hard delete also removes rows that are already soft deleted
        let row = self.require(key, &bare(!request.soft_deleted)).await?;

        let removed = if request.soft_deleted {
            self.repository
                .soft_delete(key)
                .await
                .map_err(|e| StorageError::operation("soft_delete", e))?
        } else {
            self.repository
                .delete(key)
                .await
                .map_err(|e| StorageError::operation("delete", e))?
        };
        if !removed {
            return Err(self.not_found(key));
        }

        Ok(CrudResponse::ok(self.shape(row, request.options.response)))
    }

    async fn recover(&self, request: CrudRecoverRequest) -> Result<CrudResponse, CrudError> {
        let key = &request.params;
        let restored = self
            .repository
            .restore(key)
            .await
            .map_err(|e| StorageError::operation("restore", e))?;
        if !restored {
            return Err(self.not_found(key));
        }

        let row = self.require(key, &bare(false)).await?;
        Ok(CrudResponse::ok(self.shape(row, request.options.response)))
    }

    async fn find_one(&self, key: &Key, options: &FindOptions) -> Result<Option<Value>, CrudError> {
        self.repository
            .find_one(key, options)
            .await
            .map_err(|e| StorageError::operation("find_one", e).into())
    }

    async fn require(&self, key: &Key, options: &FindOptions) -> Result<Value, CrudError> {
        self.find_one(key, options)
            .await?
            .ok_or_else(|| self.not_found(key))
    }

    async fn save(&self, key: Option<&Key>, entity: Map<String, Value>) -> Result<Value, CrudError> {
        self.repository
            .save(key, entity)
            .await
            .map_err(|e| StorageError::operation("save", e).into())
    }

    fn not_found(&self, key: &Key) -> CrudError {
        RequestError::NotFound {
            resource: self.resource.clone(),
            key: key.to_string(),
        }
        .into()
    }

    /// Reduce a row to its primary-key columns when asked to
    fn shape(&self, row: Value, shape: ResponseShape) -> Value {
        match (shape, row) {
            (ResponseShape::Id, Value::Object(mut map)) => Value::Object(
                self.factory
                    .primary_key_names()
                    .into_iter()
                    .filter_map(|name| map.remove(name).map(|value| (name.to_string(), value)))
                    .collect(),
            ),
            (_, row) => row,
        }
    }

    fn shape_all(&self, rows: Vec<Value>, shape: ResponseShape) -> Vec<Value> {
        rows.into_iter().map(|row| self.shape(row, shape)).collect()
    }
}

/// Every column, no relation
fn bare(with_deleted: bool) -> FindOptions {
    FindOptions {
        fields: Vec::new(),
        with_deleted,
        relations: Some(Vec::new()),
    }
}

fn into_object(row: Value) -> Map<String, Value> {
    match row {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CrudError> {
    serde_json::to_value(value).map_err(|e| CrudError::Internal(e.to_string()))
}
