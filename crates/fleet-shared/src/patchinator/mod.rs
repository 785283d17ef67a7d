use k8s_openapi::DeepMerge;
use kube::core::DynamicObject;
use serde::{Deserialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to deserialize dynamic object"))]
    DeserializeDynamicObject { source: serde_yaml::Error },

    #[snafu(display(
        "failed to parse dynamic object as apiVersion {target_api_version:?} and kind {target_kind:?}"
    ))]
    ParseDynamicObject {
        source: kube::core::dynamic::ParseDynamicObjectError,
        target_api_version: String,
        target_kind: String,
    },
}

pub fn parse_patches(patch: impl AsRef<str>) -> Result<Vec<DynamicObject>, Error> {
    serde_yaml::Deserializer::from_str(patch.as_ref())
        .map(|manifest| DynamicObject::deserialize(manifest).context(DeserializeDynamicObjectSnafu))
        .collect()
}

pub fn apply_patches<'a, R>(
    base: &mut R,
    patches: impl Iterator<Item = &'a DynamicObject>,
) -> Result<(), Error>
where
    R: kube::Resource<DynamicType = ()> + DeepMerge + DeserializeOwned,
{
    for patch in patches {
        apply_patch(base, patch)?;
    }
    Ok(())
}

pub fn apply_patch<R>(base: &mut R, patch: &DynamicObject) -> Result<(), Error>
where
    R: kube::Resource<DynamicType = ()> + DeepMerge + DeserializeOwned,
{
    use kube::ResourceExt;

    let Some(patch_type) = &patch.types else {
        return Ok(());
    };
    if patch_type.api_version != R::api_version(&()) || patch_type.kind != R::kind(&()) {
        return Ok(());
    }
    let Some(patch_name) = &patch.metadata.name else {
        return Ok(());
    };

    // The name always needs to match
    if &base.name_any() != patch_name {
        return Ok(());
    }

    // If there is a namespace on the base object, it needs to match as well
    // Note that it is not set for cluster-scoped objects.
    if base.namespace() != patch.metadata.namespace {
        return Ok(());
    }

    let deserialized_patch =
        patch
            .clone()
            .try_parse()
            .with_context(|_| ParseDynamicObjectSnafu {
                target_api_version: R::api_version(&()),
                target_kind: R::kind(&()),
            })?;
    base.merge_from(deserialized_patch);

    Ok(())
}
