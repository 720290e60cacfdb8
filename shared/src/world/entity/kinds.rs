use std::{ops::Deref, sync::Arc};

use crate::{world::entity::proxy::ForeignWrite, EntityKind, OperationId, Proxy, Vec3};

/// A typed view over a shared proxy of one `EntityKind`.
pub trait ProxyKind: Sized {
    const KIND: EntityKind;

    fn from_proxy(proxy: Arc<Proxy>) -> Self;

    fn proxy(&self) -> &Arc<Proxy>;

    fn try_from_proxy(proxy: Arc<Proxy>) -> Option<Self> {
        if proxy.kind() == Self::KIND {
            Some(Self::from_proxy(proxy))
        } else {
            None
        }
    }
}

macro_rules! proxy_kind {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(Arc<Proxy>);

        impl ProxyKind for $name {
            const KIND: EntityKind = $kind;

            fn from_proxy(proxy: Arc<Proxy>) -> Self {
                Self(proxy)
            }

            fn proxy(&self) -> &Arc<Proxy> {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = Proxy;

            fn deref(&self) -> &Proxy {
                &self.0
            }
        }
    };
}

proxy_kind!(
    /// A structural object: a grid of blocks, static or free moving.
    CubeGrid => EntityKind::CubeGrid
);
proxy_kind!(
    /// A voxel body such as an asteroid, backed by a storage file.
    VoxelMap => EntityKind::VoxelMap
);
proxy_kind!(
    /// A loose item floating in space.
    FloatingObject => EntityKind::FloatingObject
);
proxy_kind!(
    /// Debris on a collision course.
    Meteor => EntityKind::Meteor
);
proxy_kind!(
    /// A player or bot avatar.
    Character => EntityKind::Character
);
proxy_kind!(
    /// Any object whose type tag is not recognised.
    UnknownObject => EntityKind::Unknown
);

impl CubeGrid {
    pub const IS_STATIC: &'static str = "IsStatic";
    pub const DISPLAY_NAME: &'static str = "DisplayName";
    pub const LINEAR_VELOCITY: &'static str = "LinearVelocity";

    pub fn is_static(&self) -> bool {
        self.property(Self::IS_STATIC)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn set_is_static(&self, is_static: bool) -> bool {
        self.write_property(
            Self::IS_STATIC,
            is_static.into(),
            ForeignWrite::new(OperationId::SET_IS_STATIC),
        )
    }

    pub fn display_name(&self) -> String {
        self.property(Self::DISPLAY_NAME)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn set_display_name(&self, display_name: &str) -> bool {
        self.write_property(
            Self::DISPLAY_NAME,
            display_name.into(),
            ForeignWrite::new(OperationId::SET_DISPLAY_NAME),
        )
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.property(Self::LINEAR_VELOCITY)
            .and_then(|value| value.as_vector())
            .unwrap_or_default()
    }

    pub fn set_linear_velocity(&self, velocity: Vec3) -> bool {
        self.write_property(
            Self::LINEAR_VELOCITY,
            velocity.into(),
            ForeignWrite::with_broadcast(
                OperationId::SET_LINEAR_VELOCITY,
                OperationId::BROADCAST_LINEAR_VELOCITY,
            ),
        )
    }
}

impl VoxelMap {
    pub const STORAGE_NAME: &'static str = "StorageName";

    /// Voxel storage is owned by the foreign runtime and cannot be renamed.
    pub fn storage_name(&self) -> String {
        self.property(Self::STORAGE_NAME)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }
}

impl FloatingObject {
    pub const AMOUNT: &'static str = "Amount";

    pub fn amount(&self) -> f32 {
        self.property(Self::AMOUNT)
            .and_then(|value| value.as_float())
            .unwrap_or(0.0)
    }

    pub fn set_amount(&self, amount: f32) -> bool {
        self.write_property(
            Self::AMOUNT,
            amount.into(),
            ForeignWrite::with_broadcast(OperationId::SET_AMOUNT, OperationId::BROADCAST_AMOUNT),
        )
    }
}

impl Meteor {
    pub const INTEGRITY: &'static str = "Integrity";

    pub fn integrity(&self) -> f32 {
        self.property(Self::INTEGRITY)
            .and_then(|value| value.as_float())
            .unwrap_or(1.0)
    }

    pub fn set_integrity(&self, integrity: f32) -> bool {
        self.write_property(
            Self::INTEGRITY,
            integrity.into(),
            ForeignWrite::new(OperationId::SET_INTEGRITY),
        )
    }
}

impl Character {
    pub const BATTERY_LEVEL: &'static str = "BatteryLevel";

    pub fn battery_level(&self) -> f32 {
        self.property(Self::BATTERY_LEVEL)
            .and_then(|value| value.as_float())
            .unwrap_or(0.0)
    }

    pub fn set_battery_level(&self, battery_level: f32) -> bool {
        self.write_property(
            Self::BATTERY_LEVEL,
            battery_level.into(),
            ForeignWrite::with_broadcast(
                OperationId::SET_BATTERY_LEVEL,
                OperationId::BROADCAST_BATTERY_LEVEL,
            ),
        )
    }
}
