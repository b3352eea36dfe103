use crate::c4model::c4_items::C4ContainerItem;
use crate::common::controller::PresentationItem;
use crate::common::model::ModelType;
use crate::raaml::raaml_items::{BasicEventItem, HouseEventItem, MajorityVoteItem, ZeroEventItem};
use crate::sysml::sysml_items::ProxyPortItem;
use crate::uml::uml_items::{AssociationItem, NodeItem, PackageItem};

fn represents(model_type: ModelType) -> Option<Box<dyn PresentationItem>> {
    let item: Box<dyn PresentationItem> = match model_type {
        ModelType::Package => Box::new(PackageItem),
        ModelType::Node => Box::new(NodeItem),
        ModelType::Association => Box::new(AssociationItem),
        ModelType::ProxyPort => Box::new(ProxyPortItem),
        ModelType::C4Container => Box::new(C4ContainerItem),
        ModelType::BasicEvent => Box::new(BasicEventItem),
        ModelType::HouseEvent => Box::new(HouseEventItem),
        ModelType::ZeroEvent => Box::new(ZeroEventItem),
        ModelType::MajorityVoteGate => Box::new(MajorityVoteItem),
        _ => return None,
    };
    Some(item)
}

/// Item kind showing elements of `model_type`, the closest registered ancestor winning.
pub fn presentation_for(model_type: ModelType) -> Option<Box<dyn PresentationItem>> {
    std::iter::successors(Some(model_type), |t| t.parent()).find_map(represents)
}
