//! Service catalog: the read side used by booking and the admin operations.

use sqlx::SqlitePool;

use crate::database::models::service::{NewService, Service};
use crate::error::BookingError;
use crate::utils::validation::{
    parse_duration, parse_price, validate_description, validate_service_name,
};

/// One field change applied by `/editservice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEdit {
    Name(String),
    Description(String),
    /// Minor currency units.
    Price(i64),
    /// Minutes.
    Duration(i64),
}

impl ServiceEdit {
    /// Parses `field value` where field is name, description, price or duration.
    /// Prices are typed in major units.
    pub fn parse(field: &str, value: &str) -> Result<Self, BookingError> {
        let invalid = |e: anyhow::Error| BookingError::InvalidInput(e.to_string());
        let value = value.trim();
        match field.trim().to_lowercase().as_str() {
            "name" => {
                validate_service_name(value).map_err(invalid)?;
                Ok(ServiceEdit::Name(value.to_string()))
            }
            "description" | "desc" => {
                validate_description(value).map_err(invalid)?;
                Ok(ServiceEdit::Description(value.to_string()))
            }
            "price" => Ok(ServiceEdit::Price(parse_price(value).map_err(invalid)?)),
            "duration" => Ok(ServiceEdit::Duration(parse_duration(value).map_err(invalid)?)),
            other => Err(BookingError::InvalidInput(format!(
                "unknown field '{other}', use name, description, price or duration"
            ))),
        }
    }

    fn apply(self, service: &mut Service) {
        match self {
            ServiceEdit::Name(name) => service.name = name,
            ServiceEdit::Description(description) => service.description = description,
            ServiceEdit::Price(price) => service.price = price,
            ServiceEdit::Duration(duration) => service.duration = duration,
        }
    }
}

/// Services offered on a fresh install.
pub fn default_services() -> Vec<NewService> {
    [
        ("Classic massage", "Full body strengthening massage", 60, 300000),
        ("Relaxing massage", "Deep relaxing massage", 90, 400000),
        ("Sports massage", "Massage for athletes and active people", 60, 350000),
        ("Leg depilation", "Full leg depilation", 45, 250000),
        ("Arm depilation", "Full arm depilation", 30, 150000),
        ("Bikini depilation", "Classic bikini depilation", 30, 200000),
    ]
    .into_iter()
    .map(|(name, description, duration, price)| NewService {
        name: name.to_string(),
        description: description.to_string(),
        duration,
        price,
    })
    .collect()
}

#[derive(Clone)]
/// Salon services: the client-facing list and admin maintenance.
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Services clients can book, in catalog order.
    pub async fn get_active(&self) -> Result<Vec<Service>, BookingError> {
        Ok(Service::find_active(&self.pool).await?)
    }

    /// Any non-deleted service, active or not.
    pub async fn get_by_id(&self, id: i64) -> Result<Service, BookingError> {
        Service::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| BookingError::NotFound("service".to_string()))
    }

    /// Every non-deleted service, including inactive ones.
    pub async fn list_all(&self) -> Result<Vec<Service>, BookingError> {
        Ok(Service::find_all(&self.pool).await?)
    }

    /// Validates and stores a new service.
    pub async fn create(&self, new: NewService) -> Result<Service, BookingError> {
        let invalid = |e: anyhow::Error| BookingError::InvalidInput(e.to_string());
        validate_service_name(&new.name).map_err(invalid)?;
        validate_description(&new.description).map_err(invalid)?;
        if new.duration <= 0 {
            return Err(BookingError::InvalidInput("duration must be positive".to_string()));
        }
        if new.price < 0 {
            return Err(BookingError::InvalidInput("price cannot be negative".to_string()));
        }

        let new = NewService {
            name: new.name.trim().to_string(),
            description: new.description.trim().to_string(),
            ..new
        };
        let service = Service::create(&self.pool, &new).await?;
        tracing::info!("Created service {} '{}'", service.id, service.name);
        Ok(service)
    }

    /// Applies one field change and saves it.
    pub async fn edit(&self, id: i64, edit: ServiceEdit) -> Result<Service, BookingError> {
        let mut service = self.get_by_id(id).await?;
        edit.apply(&mut service);
        self.save(&service).await?;
        tracing::info!("Updated service {}", id);
        Ok(service)
    }

    /// Hides a visible service or brings a hidden one back.
    pub async fn toggle_active(&self, id: i64) -> Result<Service, BookingError> {
        let mut service = self.get_by_id(id).await?;
        service.is_active = !service.is_active;
        self.save(&service).await?;
        tracing::info!("Service {} is now {}", id, if service.is_active { "active" } else { "inactive" });
        Ok(service)
    }

    /// Soft delete; existing bookings keep their service.
    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        if !Service::soft_delete(&self.pool, id).await? {
            return Err(BookingError::NotFound("service".to_string()));
        }
        tracing::info!("Deleted service {}", id);
        Ok(())
    }

    /// Inserts the default services when the catalog has never been populated.
    /// Returns how many were inserted.
    pub async fn seed_defaults(&self) -> Result<usize, BookingError> {
        if Service::count_all(&self.pool).await? > 0 {
            tracing::debug!("Catalog already seeded");
            return Ok(0);
        }
        let defaults = default_services();
        for new in &defaults {
            Service::create(&self.pool, new).await?;
        }
        tracing::info!("Seeded catalog with {} services", defaults.len());
        Ok(defaults.len())
    }

    async fn save(&self, service: &Service) -> Result<(), BookingError> {
        if !service.save(&self.pool).await? {
            return Err(BookingError::NotFound("service".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_edit() {
        assert_eq!(
            ServiceEdit::parse("price", "3500").unwrap(),
            ServiceEdit::Price(350000)
        );
        assert_eq!(
            ServiceEdit::parse("Duration", " 90 ").unwrap(),
            ServiceEdit::Duration(90)
        );
        assert_eq!(
            ServiceEdit::parse("name", "Hot stones").unwrap(),
            ServiceEdit::Name("Hot stones".to_string())
        );
        assert!(matches!(
            ServiceEdit::parse("colour", "red"),
            Err(BookingError::InvalidInput(_))
        ));
        assert!(ServiceEdit::parse("duration", "0").is_err());
        assert!(ServiceEdit::parse("name", "").is_err());
    }

    #[test]
    fn test_default_catalog() {
        let defaults = default_services();
        assert_eq!(defaults.len(), 6);
        assert!(defaults.iter().all(|s| s.duration > 0 && s.price > 0));
        assert_eq!(defaults[0].price, 300000);
    }
}
