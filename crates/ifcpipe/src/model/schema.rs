//! The part of the IFC entity hierarchy needed to classify instances.
//!
//! STEP files spell entity names in upper case (`IFCWALLSTANDARDCASE`); this
//! table maps them back to their canonical names and supertypes. Names that are
//! not listed are kept verbatim and only match themselves.

use std::collections::HashMap;
use std::sync::OnceLock;

pub const IFC_ROOT: &str = "IfcRoot";
pub const IFC_PRODUCT: &str = "IfcProduct";
pub const IFC_ELEMENT: &str = "IfcElement";
pub const IFC_APPLICATION: &str = "IfcApplication";
pub const IFC_REL_DEFINES_BY_PROPERTIES: &str = "IfcRelDefinesByProperties";
pub const IFC_PROPERTY_SET: &str = "IfcPropertySet";
pub const IFC_PROPERTY_SINGLE_VALUE: &str = "IfcPropertySingleValue";
pub const IFC_REL_CONTAINED_IN_SPATIAL_STRUCTURE: &str = "IfcRelContainedInSpatialStructure";
pub const IFC_REL_AGGREGATES: &str = "IfcRelAggregates";
pub const IFC_REL_CONNECTS_ELEMENTS: &str = "IfcRelConnectsElements";
pub const IFC_REL_INTERFERES_ELEMENTS: &str = "IfcRelInterferesElements";
pub const IFC_REL_VOIDS_ELEMENT: &str = "IfcRelVoidsElement";
pub const IFC_REL_FILLS_ELEMENT: &str = "IfcRelFillsElement";

/// Attribute positions, shared by every subtype of the declaring entity.
pub mod attr {
    // IfcRoot
    pub const GLOBAL_ID: usize = 0;
    pub const NAME: usize = 2;
    pub const DESCRIPTION: usize = 3;

    // IfcRelDefinesByProperties
    pub const DEFINES_RELATED_OBJECTS: usize = 4;
    pub const DEFINES_RELATING_PROPERTY_DEFINITION: usize = 5;

    // IfcPropertySet
    pub const PSET_HAS_PROPERTIES: usize = 4;

    // IfcProperty / IfcPropertySingleValue
    pub const PROPERTY_NAME: usize = 0;
    pub const PROPERTY_NOMINAL_VALUE: usize = 2;

    // IfcRelContainedInSpatialStructure
    pub const CONTAINED_RELATED_ELEMENTS: usize = 4;
    pub const CONTAINED_RELATING_STRUCTURE: usize = 5;

    // IfcRelAggregates
    pub const AGGREGATES_RELATING_OBJECT: usize = 4;
    pub const AGGREGATES_RELATED_OBJECTS: usize = 5;

    // IfcRelConnectsElements
    pub const CONNECTS_RELATING_ELEMENT: usize = 5;
    pub const CONNECTS_RELATED_ELEMENT: usize = 6;

    // IfcRelInterferesElements
    pub const INTERFERES_RELATING_ELEMENT: usize = 4;
    pub const INTERFERES_RELATED_ELEMENT: usize = 5;

    // IfcRelVoidsElement
    pub const VOIDS_RELATING_BUILDING_ELEMENT: usize = 4;
    pub const VOIDS_RELATED_OPENING_ELEMENT: usize = 5;

    // IfcRelFillsElement
    pub const FILLS_RELATING_OPENING_ELEMENT: usize = 4;
    pub const FILLS_RELATED_BUILDING_ELEMENT: usize = 5;

    // IfcApplication
    pub const APPLICATION_FULL_NAME: usize = 2;
}

/// (entity, supertype) pairs covering the IfcProduct and IfcRelConnects
/// subtrees of IFC2X3, IFC4 and IFC4X3. Where an entity moved between
/// releases the IFC4 supertype is listed; every chain still reaches the
/// same abstract ancestors.
const HIERARCHY: &[(&str, Option<&str>)] = &[
    ("IfcRoot", None),
    ("IfcObjectDefinition", Some("IfcRoot")),
    ("IfcObject", Some("IfcObjectDefinition")),
    ("IfcContext", Some("IfcObjectDefinition")),
    ("IfcProject", Some("IfcContext")),
    ("IfcProjectLibrary", Some("IfcContext")),
    ("IfcProduct", Some("IfcObject")),
    // elements
    ("IfcElement", Some("IfcProduct")),
    ("IfcBuildingElement", Some("IfcElement")),
    ("IfcBuiltElement", Some("IfcElement")),
    ("IfcWall", Some("IfcBuildingElement")),
    ("IfcWallStandardCase", Some("IfcWall")),
    ("IfcWallElementedCase", Some("IfcWall")),
    ("IfcDoor", Some("IfcBuildingElement")),
    ("IfcDoorStandardCase", Some("IfcDoor")),
    ("IfcWindow", Some("IfcBuildingElement")),
    ("IfcWindowStandardCase", Some("IfcWindow")),
    ("IfcSlab", Some("IfcBuildingElement")),
    ("IfcSlabStandardCase", Some("IfcSlab")),
    ("IfcSlabElementedCase", Some("IfcSlab")),
    ("IfcBeam", Some("IfcBuildingElement")),
    ("IfcBeamStandardCase", Some("IfcBeam")),
    ("IfcColumn", Some("IfcBuildingElement")),
    ("IfcColumnStandardCase", Some("IfcColumn")),
    ("IfcMember", Some("IfcBuildingElement")),
    ("IfcMemberStandardCase", Some("IfcMember")),
    ("IfcPlate", Some("IfcBuildingElement")),
    ("IfcPlateStandardCase", Some("IfcPlate")),
    ("IfcRoof", Some("IfcBuildingElement")),
    ("IfcStair", Some("IfcBuildingElement")),
    ("IfcStairFlight", Some("IfcBuildingElement")),
    ("IfcRamp", Some("IfcBuildingElement")),
    ("IfcRampFlight", Some("IfcBuildingElement")),
    ("IfcRailing", Some("IfcBuildingElement")),
    ("IfcCovering", Some("IfcBuildingElement")),
    ("IfcCurtainWall", Some("IfcBuildingElement")),
    ("IfcFooting", Some("IfcBuildingElement")),
    ("IfcDeepFoundation", Some("IfcBuildingElement")),
    ("IfcPile", Some("IfcDeepFoundation")),
    ("IfcCaissonFoundation", Some("IfcDeepFoundation")),
    ("IfcChimney", Some("IfcBuildingElement")),
    ("IfcShadingDevice", Some("IfcBuildingElement")),
    ("IfcBuildingElementProxy", Some("IfcBuildingElement")),
    ("IfcBearing", Some("IfcBuiltElement")),
    ("IfcCourse", Some("IfcBuiltElement")),
    ("IfcEarthworksElement", Some("IfcBuiltElement")),
    ("IfcEarthworksFill", Some("IfcEarthworksElement")),
    ("IfcReinforcedSoil", Some("IfcEarthworksElement")),
    ("IfcKerb", Some("IfcBuiltElement")),
    ("IfcMooringDevice", Some("IfcBuiltElement")),
    ("IfcNavigationElement", Some("IfcBuiltElement")),
    ("IfcPavement", Some("IfcBuiltElement")),
    ("IfcRail", Some("IfcBuiltElement")),
    ("IfcTrackElement", Some("IfcBuiltElement")),
    ("IfcBuildingElementComponent", Some("IfcBuildingElement")),
    ("IfcFeatureElement", Some("IfcElement")),
    ("IfcFeatureElementSubtraction", Some("IfcFeatureElement")),
    ("IfcFeatureElementAddition", Some("IfcFeatureElement")),
    ("IfcOpeningElement", Some("IfcFeatureElementSubtraction")),
    ("IfcOpeningStandardCase", Some("IfcOpeningElement")),
    ("IfcOpeningRecess", Some("IfcOpeningElement")),
    ("IfcVoidingFeature", Some("IfcFeatureElementSubtraction")),
    ("IfcEarthworksCut", Some("IfcFeatureElementSubtraction")),
    ("IfcEdgeFeature", Some("IfcFeatureElementSubtraction")),
    ("IfcChamferEdgeFeature", Some("IfcEdgeFeature")),
    ("IfcRoundedEdgeFeature", Some("IfcEdgeFeature")),
    ("IfcProjectionElement", Some("IfcFeatureElementAddition")),
    ("IfcSurfaceFeature", Some("IfcFeatureElement")),
    ("IfcFurnishingElement", Some("IfcElement")),
    ("IfcFurniture", Some("IfcFurnishingElement")),
    ("IfcSystemFurnitureElement", Some("IfcFurnishingElement")),
    ("IfcElementAssembly", Some("IfcElement")),
    ("IfcElementComponent", Some("IfcElement")),
    ("IfcBuildingElementPart", Some("IfcElementComponent")),
    ("IfcDiscreteAccessory", Some("IfcElementComponent")),
    ("IfcFastener", Some("IfcElementComponent")),
    ("IfcMechanicalFastener", Some("IfcElementComponent")),
    ("IfcImpactProtectionDevice", Some("IfcElementComponent")),
    ("IfcSign", Some("IfcElementComponent")),
    ("IfcVibrationIsolator", Some("IfcElementComponent")),
    ("IfcVibrationDamper", Some("IfcElementComponent")),
    ("IfcReinforcingElement", Some("IfcElementComponent")),
    ("IfcReinforcingBar", Some("IfcReinforcingElement")),
    ("IfcReinforcingMesh", Some("IfcReinforcingElement")),
    ("IfcTendon", Some("IfcReinforcingElement")),
    ("IfcTendonAnchor", Some("IfcReinforcingElement")),
    ("IfcTendonConduit", Some("IfcReinforcingElement")),
    ("IfcTransportElement", Some("IfcElement")),
    ("IfcTransportationDevice", Some("IfcElement")),
    ("IfcVehicle", Some("IfcTransportationDevice")),
    ("IfcVirtualElement", Some("IfcElement")),
    ("IfcGeographicElement", Some("IfcElement")),
    ("IfcCivilElement", Some("IfcElement")),
    ("IfcEquipmentElement", Some("IfcElement")),
    ("IfcElectricalElement", Some("IfcElement")),
    // distribution
    ("IfcDistributionElement", Some("IfcElement")),
    ("IfcDistributionControlElement", Some("IfcDistributionElement")),
    ("IfcActuator", Some("IfcDistributionControlElement")),
    ("IfcAlarm", Some("IfcDistributionControlElement")),
    ("IfcController", Some("IfcDistributionControlElement")),
    ("IfcFlowInstrument", Some("IfcDistributionControlElement")),
    ("IfcProtectiveDeviceTrippingUnit", Some("IfcDistributionControlElement")),
    ("IfcSensor", Some("IfcDistributionControlElement")),
    ("IfcUnitaryControlElement", Some("IfcDistributionControlElement")),
    ("IfcDistributionFlowElement", Some("IfcDistributionElement")),
    ("IfcDistributionChamberElement", Some("IfcDistributionFlowElement")),
    ("IfcEnergyConversionDevice", Some("IfcDistributionFlowElement")),
    ("IfcAirToAirHeatRecovery", Some("IfcEnergyConversionDevice")),
    ("IfcBoiler", Some("IfcEnergyConversionDevice")),
    ("IfcBurner", Some("IfcEnergyConversionDevice")),
    ("IfcChiller", Some("IfcEnergyConversionDevice")),
    ("IfcCoil", Some("IfcEnergyConversionDevice")),
    ("IfcCondenser", Some("IfcEnergyConversionDevice")),
    ("IfcCooledBeam", Some("IfcEnergyConversionDevice")),
    ("IfcCoolingTower", Some("IfcEnergyConversionDevice")),
    ("IfcElectricGenerator", Some("IfcEnergyConversionDevice")),
    ("IfcElectricMotor", Some("IfcEnergyConversionDevice")),
    ("IfcEngine", Some("IfcEnergyConversionDevice")),
    ("IfcEvaporativeCooler", Some("IfcEnergyConversionDevice")),
    ("IfcEvaporator", Some("IfcEnergyConversionDevice")),
    ("IfcHeatExchanger", Some("IfcEnergyConversionDevice")),
    ("IfcHumidifier", Some("IfcEnergyConversionDevice")),
    ("IfcMotorConnection", Some("IfcEnergyConversionDevice")),
    ("IfcSolarDevice", Some("IfcEnergyConversionDevice")),
    ("IfcTransformer", Some("IfcEnergyConversionDevice")),
    ("IfcTubeBundle", Some("IfcEnergyConversionDevice")),
    ("IfcUnitaryEquipment", Some("IfcEnergyConversionDevice")),
    ("IfcFlowController", Some("IfcDistributionFlowElement")),
    ("IfcAirTerminalBox", Some("IfcFlowController")),
    ("IfcDamper", Some("IfcFlowController")),
    ("IfcDistributionBoard", Some("IfcFlowController")),
    ("IfcElectricDistributionBoard", Some("IfcFlowController")),
    ("IfcElectricDistributionPoint", Some("IfcFlowController")),
    ("IfcElectricTimeControl", Some("IfcFlowController")),
    ("IfcFlowMeter", Some("IfcFlowController")),
    ("IfcProtectiveDevice", Some("IfcFlowController")),
    ("IfcSwitchingDevice", Some("IfcFlowController")),
    ("IfcValve", Some("IfcFlowController")),
    ("IfcFlowFitting", Some("IfcDistributionFlowElement")),
    ("IfcCableCarrierFitting", Some("IfcFlowFitting")),
    ("IfcCableFitting", Some("IfcFlowFitting")),
    ("IfcDuctFitting", Some("IfcFlowFitting")),
    ("IfcJunctionBox", Some("IfcFlowFitting")),
    ("IfcPipeFitting", Some("IfcFlowFitting")),
    ("IfcFlowMovingDevice", Some("IfcDistributionFlowElement")),
    ("IfcCompressor", Some("IfcFlowMovingDevice")),
    ("IfcFan", Some("IfcFlowMovingDevice")),
    ("IfcPump", Some("IfcFlowMovingDevice")),
    ("IfcFlowSegment", Some("IfcDistributionFlowElement")),
    ("IfcCableCarrierSegment", Some("IfcFlowSegment")),
    ("IfcCableSegment", Some("IfcFlowSegment")),
    ("IfcConveyorSegment", Some("IfcFlowSegment")),
    ("IfcDuctSegment", Some("IfcFlowSegment")),
    ("IfcPipeSegment", Some("IfcFlowSegment")),
    ("IfcFlowStorageDevice", Some("IfcDistributionFlowElement")),
    ("IfcElectricFlowStorageDevice", Some("IfcFlowStorageDevice")),
    ("IfcTank", Some("IfcFlowStorageDevice")),
    ("IfcFlowTerminal", Some("IfcDistributionFlowElement")),
    ("IfcAirTerminal", Some("IfcFlowTerminal")),
    ("IfcAudioVisualAppliance", Some("IfcFlowTerminal")),
    ("IfcCommunicationsAppliance", Some("IfcFlowTerminal")),
    ("IfcElectricAppliance", Some("IfcFlowTerminal")),
    ("IfcFireSuppressionTerminal", Some("IfcFlowTerminal")),
    ("IfcLamp", Some("IfcFlowTerminal")),
    ("IfcLightFixture", Some("IfcFlowTerminal")),
    ("IfcLiquidTerminal", Some("IfcFlowTerminal")),
    ("IfcMedicalDevice", Some("IfcFlowTerminal")),
    ("IfcMobileTelecommunicationsAppliance", Some("IfcFlowTerminal")),
    ("IfcOutlet", Some("IfcFlowTerminal")),
    ("IfcSanitaryTerminal", Some("IfcFlowTerminal")),
    ("IfcSignal", Some("IfcFlowTerminal")),
    ("IfcSpaceHeater", Some("IfcFlowTerminal")),
    ("IfcStackTerminal", Some("IfcFlowTerminal")),
    ("IfcWasteTerminal", Some("IfcFlowTerminal")),
    ("IfcFlowTreatmentDevice", Some("IfcDistributionFlowElement")),
    ("IfcDuctSilencer", Some("IfcFlowTreatmentDevice")),
    ("IfcElectricFlowTreatmentDevice", Some("IfcFlowTreatmentDevice")),
    ("IfcFilter", Some("IfcFlowTreatmentDevice")),
    ("IfcInterceptor", Some("IfcFlowTreatmentDevice")),
    // spatial structure
    ("IfcSpatialElement", Some("IfcProduct")),
    ("IfcSpatialStructureElement", Some("IfcSpatialElement")),
    ("IfcSite", Some("IfcSpatialStructureElement")),
    ("IfcBuilding", Some("IfcSpatialStructureElement")),
    ("IfcBuildingStorey", Some("IfcSpatialStructureElement")),
    ("IfcSpace", Some("IfcSpatialStructureElement")),
    ("IfcFacility", Some("IfcSpatialStructureElement")),
    ("IfcBridge", Some("IfcFacility")),
    ("IfcMarineFacility", Some("IfcFacility")),
    ("IfcRailway", Some("IfcFacility")),
    ("IfcRoad", Some("IfcFacility")),
    ("IfcFacilityPart", Some("IfcSpatialStructureElement")),
    ("IfcBridgePart", Some("IfcFacilityPart")),
    ("IfcFacilityPartCommon", Some("IfcFacilityPart")),
    ("IfcMarinePart", Some("IfcFacilityPart")),
    ("IfcRailwayPart", Some("IfcFacilityPart")),
    ("IfcRoadPart", Some("IfcFacilityPart")),
    ("IfcSpatialZone", Some("IfcSpatialElement")),
    ("IfcExternalSpatialStructureElement", Some("IfcSpatialElement")),
    ("IfcExternalSpatialElement", Some("IfcExternalSpatialStructureElement")),
    // positioning
    ("IfcPositioningElement", Some("IfcProduct")),
    ("IfcGrid", Some("IfcPositioningElement")),
    ("IfcLinearPositioningElement", Some("IfcPositioningElement")),
    ("IfcAlignment", Some("IfcLinearPositioningElement")),
    ("IfcReferent", Some("IfcPositioningElement")),
    ("IfcLinearElement", Some("IfcProduct")),
    ("IfcAlignmentCant", Some("IfcLinearElement")),
    ("IfcAlignmentHorizontal", Some("IfcLinearElement")),
    ("IfcAlignmentVertical", Some("IfcLinearElement")),
    ("IfcAlignmentSegment", Some("IfcLinearElement")),
    // other products
    ("IfcAnnotation", Some("IfcProduct")),
    ("IfcProxy", Some("IfcProduct")),
    ("IfcPort", Some("IfcProduct")),
    ("IfcDistributionPort", Some("IfcPort")),
    ("IfcStructuralItem", Some("IfcProduct")),
    ("IfcStructuralMember", Some("IfcStructuralItem")),
    ("IfcStructuralCurveMember", Some("IfcStructuralMember")),
    ("IfcStructuralCurveMemberVarying", Some("IfcStructuralCurveMember")),
    ("IfcStructuralSurfaceMember", Some("IfcStructuralMember")),
    ("IfcStructuralSurfaceMemberVarying", Some("IfcStructuralSurfaceMember")),
    ("IfcStructuralConnection", Some("IfcStructuralItem")),
    ("IfcStructuralCurveConnection", Some("IfcStructuralConnection")),
    ("IfcStructuralPointConnection", Some("IfcStructuralConnection")),
    ("IfcStructuralSurfaceConnection", Some("IfcStructuralConnection")),
    ("IfcStructuralActivity", Some("IfcProduct")),
    ("IfcStructuralAction", Some("IfcStructuralActivity")),
    ("IfcStructuralCurveAction", Some("IfcStructuralAction")),
    ("IfcStructuralLinearAction", Some("IfcStructuralCurveAction")),
    ("IfcStructuralLinearActionVarying", Some("IfcStructuralLinearAction")),
    ("IfcStructuralPointAction", Some("IfcStructuralAction")),
    ("IfcStructuralSurfaceAction", Some("IfcStructuralAction")),
    ("IfcStructuralPlanarAction", Some("IfcStructuralSurfaceAction")),
    ("IfcStructuralPlanarActionVarying", Some("IfcStructuralPlanarAction")),
    ("IfcStructuralReaction", Some("IfcStructuralActivity")),
    ("IfcStructuralCurveReaction", Some("IfcStructuralReaction")),
    ("IfcStructuralPointReaction", Some("IfcStructuralReaction")),
    ("IfcStructuralSurfaceReaction", Some("IfcStructuralReaction")),
    // relationships
    ("IfcRelationship", Some("IfcRoot")),
    ("IfcRelConnects", Some("IfcRelationship")),
    ("IfcRelContainedInSpatialStructure", Some("IfcRelConnects")),
    ("IfcRelConnectsElements", Some("IfcRelConnects")),
    ("IfcRelConnectsPathElements", Some("IfcRelConnectsElements")),
    ("IfcRelConnectsWithRealizingElements", Some("IfcRelConnectsElements")),
    ("IfcRelInterferesElements", Some("IfcRelConnects")),
    ("IfcRelConnectsPortToElement", Some("IfcRelConnects")),
    ("IfcRelConnectsPorts", Some("IfcRelConnects")),
    ("IfcRelConnectsStructuralActivity", Some("IfcRelConnects")),
    ("IfcRelConnectsStructuralMember", Some("IfcRelConnects")),
    ("IfcRelConnectsWithEccentricity", Some("IfcRelConnectsStructuralMember")),
    ("IfcRelCoversBldgElements", Some("IfcRelConnects")),
    ("IfcRelCoversSpaces", Some("IfcRelConnects")),
    ("IfcRelFlowControlElements", Some("IfcRelConnects")),
    ("IfcRelReferencedInSpatialStructure", Some("IfcRelConnects")),
    ("IfcRelSequence", Some("IfcRelConnects")),
    ("IfcRelServicesBuildings", Some("IfcRelConnects")),
    ("IfcRelSpaceBoundary", Some("IfcRelConnects")),
    ("IfcRelFillsElement", Some("IfcRelConnects")),
    ("IfcRelDecomposes", Some("IfcRelationship")),
    ("IfcRelAggregates", Some("IfcRelDecomposes")),
    ("IfcRelNests", Some("IfcRelDecomposes")),
    ("IfcRelProjectsElement", Some("IfcRelDecomposes")),
    ("IfcRelVoidsElement", Some("IfcRelDecomposes")),
    ("IfcRelDefines", Some("IfcRelationship")),
    ("IfcRelDefinesByProperties", Some("IfcRelDefines")),
    ("IfcRelDefinesByType", Some("IfcRelDefines")),
    // property definitions
    ("IfcPropertyDefinition", Some("IfcRoot")),
    ("IfcPropertySetDefinition", Some("IfcPropertyDefinition")),
    ("IfcPropertySet", Some("IfcPropertySetDefinition")),
    ("IfcElementQuantity", Some("IfcPropertySetDefinition")),
    ("IfcProperty", None),
    ("IfcSimpleProperty", Some("IfcProperty")),
    ("IfcPropertySingleValue", Some("IfcSimpleProperty")),
    ("IfcPropertyEnumeratedValue", Some("IfcSimpleProperty")),
    ("IfcPropertyListValue", Some("IfcSimpleProperty")),
    ("IfcApplication", None),
];

struct TypeEntry {
    canonical: &'static str,
    parent: Option<&'static str>,
}

fn registry() -> &'static HashMap<String, TypeEntry> {
    static REGISTRY: OnceLock<HashMap<String, TypeEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        HIERARCHY
            .iter()
            .map(|(name, parent)| {
                (
                    name.to_ascii_uppercase(),
                    TypeEntry {
                        canonical: name,
                        parent: *parent,
                    },
                )
            })
            .collect()
    })
}

/// Canonical spelling of an entity name; unknown names come back unchanged.
pub fn canonical_name(raw: &str) -> &str {
    registry()
        .get(&raw.to_ascii_uppercase())
        .map(|e| e.canonical)
        .unwrap_or(raw)
}

/// True when `raw` names `ancestor` or one of its subtypes.
pub fn is_subtype_of(raw: &str, ancestor: &str) -> bool {
    if raw.eq_ignore_ascii_case(ancestor) {
        return true;
    }
    let types = registry();
    let mut current = types.get(&raw.to_ascii_uppercase());
    while let Some(entry) = current {
        match entry.parent {
            Some(parent) if parent.eq_ignore_ascii_case(ancestor) => return true,
            Some(parent) => current = types.get(&parent.to_ascii_uppercase()),
            None => return false,
        }
    }
    false
}
