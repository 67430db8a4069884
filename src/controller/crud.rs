use crate::models::entity::Entity;
use crate::repository::{finish, Repository, Store};
use crate::service::entity::EntityService;
use crate::service::ServiceError;
use crate::AppState;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn service<S: Store, E: Entity>(data: &AppState<S>) -> EntityService<E> {
    EntityService::new(data.services.pagination)
}

pub async fn list<S, E>(
    data: Data<AppState<S>>,
    params: Query<PageParams>,
) -> Result<HttpResponse, ServiceError>
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    let mut session = data.store.begin().await?;
    let result = service::<S, E>(&data)
        .list(&mut session, params.limit, params.offset)
        .await;
    let rows = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn get<S, E>(data: Data<AppState<S>>, id: Path<E::Id>) -> Result<HttpResponse, ServiceError>
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    let mut session = data.store.begin().await?;
    let result = service::<S, E>(&data).fetch(&mut session, &id).await;
    let row = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(row))
}

pub async fn create<S, E>(data: Data<AppState<S>>, body: Json<E>) -> Result<HttpResponse, ServiceError>
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    let mut session = data.store.begin().await?;
    let result = service::<S, E>(&data)
        .create(&mut session, body.into_inner())
        .await;
    let row = finish(session, result).await?;
    Ok(HttpResponse::Created().json(row))
}

pub async fn update<S, E>(
    data: Data<AppState<S>>,
    id: Path<E::Id>,
    patch: Json<E::Patch>,
) -> Result<HttpResponse, ServiceError>
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    let mut session = data.store.begin().await?;
    let result = service::<S, E>(&data).update(&mut session, &id, &patch).await;
    let row = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(row))
}

pub async fn delete<S, E>(data: Data<AppState<S>>, id: Path<E::Id>) -> Result<HttpResponse, ServiceError>
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    let mut session = data.store.begin().await?;
    let result = service::<S, E>(&data).delete(&mut session, &id).await;
    if finish(session, result).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ServiceError::NotFound(format!("{} with id {} not found", E::NAME, id)))
    }
}
